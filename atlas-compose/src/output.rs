//! Compact single-line JSON output.
//!
//! Every document is written on one line with null and empty fields removed,
//! so command output stays small and pipes cleanly into the next command.

use crate::errors::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Display;
use std::io::{self, Write};

/// Returns true for null, empty strings, empty arrays and empty objects.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Drops top-level fields whose value is null or empty.
#[must_use]
pub fn remove_empty<I>(data: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (String, Value)>,
{
    data.into_iter().filter(|(_, v)| !is_empty(v)).collect()
}

fn write_line<W: Write>(writer: &mut W, data: &Map<String, Value>) -> Result<()> {
    serde_json::to_writer(&mut *writer, data)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Writes `data` with `ok: true`.
pub fn write_success<W, I>(writer: &mut W, data: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (String, Value)>,
{
    let mut cleaned = remove_empty(data);
    cleaned.insert("ok".to_string(), Value::Bool(true));
    write_line(writer, &cleaned)
}

/// Writes `ok: false` and the error message, merged with `details`.
///
/// A detail named `ok` or `err` overrides the generated field.
pub fn write_error<W, E, I>(writer: &mut W, err: &E, details: I) -> Result<()>
where
    W: Write,
    E: Display + ?Sized,
    I: IntoIterator<Item = (String, Value)>,
{
    let mut data = Map::new();
    data.insert("ok".to_string(), Value::Bool(false));
    data.insert("err".to_string(), Value::String(err.to_string()));
    data.extend(details);
    write_line(writer, &remove_empty(data))
}

/// Writes one cleaned object on its own line, for streaming output.
pub fn write_stream_line<W, I>(writer: &mut W, data: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (String, Value)>,
{
    write_line(writer, &remove_empty(data))
}

/// Writes values one per line, for piping into `xargs`.
pub fn write_lines<W: Write, S: AsRef<str>>(writer: &mut W, values: &[S]) -> Result<()> {
    writeln!(writer, "{}", crate::input::format_as_lines(values))?;
    Ok(())
}

/// Writes `{"items": [...], "ok": true}`.
pub fn write_array<W: Write, T: Serialize>(writer: &mut W, items: &[T]) -> Result<()> {
    let items = serde_json::to_value(items)?;
    write_success(writer, [("items".to_string(), items)])
}

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Compact JSON document.
    #[default]
    Json,
    /// One value per line, for piping into `xargs`.
    Lines,
}

impl OutputFormat {
    /// Parses `json` or `lines`; anything else is JSON.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("lines") {
            Self::Lines
        } else {
            Self::Json
        }
    }
}

/// Array fields searched, in order, for values to print in lines mode.
const LINE_ARRAY_FIELDS: [&str; 5] = ["items", "results", "phases", "decisions", "features"];

/// Object fields tried, in order, as the value of each line.
const LINE_VALUE_FIELDS: [&str; 3] = ["id", "path", "name"];

/// Returns every non-empty string value of `field` across `items`.
#[must_use]
pub fn lines_from_field(items: &[Value], field: &str) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
        .collect()
}

/// Picks the lines to print for `data`, if it holds a list of records.
fn select_lines(data: &Map<String, Value>) -> Option<Vec<String>> {
    LINE_ARRAY_FIELDS.iter().find_map(|key| {
        let items = data.get(*key)?.as_array()?;
        let first = items.first()?.as_object()?;
        LINE_VALUE_FIELDS
            .iter()
            .find(|field| first.contains_key(**field))
            .map(|field| lines_from_field(items, field))
    })
}

/// Writes `data` in the requested format.
///
/// Lines mode prints one ID, path or name per record of the first list field
/// it recognizes and falls back to JSON when there is none.
pub fn write_with_format<W: Write>(
    writer: &mut W,
    data: Map<String, Value>,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Lines {
        if let Some(values) = select_lines(&data) {
            return write_lines(writer, &values);
        }
    }
    write_success(writer, data)
}

/// [`write_success`] to stdout.
pub fn success<I>(data: I) -> Result<()>
where
    I: IntoIterator<Item = (String, Value)>,
{
    write_success(&mut io::stdout().lock(), data)
}

/// [`write_error`] to stdout.
pub fn error<E, I>(err: &E, details: I) -> Result<()>
where
    E: Display + ?Sized,
    I: IntoIterator<Item = (String, Value)>,
{
    write_error(&mut io::stdout().lock(), err, details)
}

/// [`write_stream_line`] to stdout.
pub fn stream_line<I>(data: I) -> Result<()>
where
    I: IntoIterator<Item = (String, Value)>,
{
    write_stream_line(&mut io::stdout().lock(), data)
}

/// [`write_with_format`] to stdout.
pub fn success_with_format(data: Map<String, Value>, format: OutputFormat) -> Result<()> {
    write_with_format(&mut io::stdout().lock(), data, format)
}

/// [`write_lines`] to stdout.
pub fn lines<S: AsRef<str>>(values: &[S]) -> Result<()> {
    write_lines(&mut io::stdout().lock(), values)
}
