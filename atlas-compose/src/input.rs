//! Piped JSON input for batch commands.
//!
//! Commands accept a single object, an array of objects, or an array of
//! plain strings on stdin. Strings are treated as IDs.

use crate::errors::{ComposeError, Result};
use serde_json::{Map, Value};
use std::io::{self, IsTerminal, Read};
use tracing::debug;

/// Fields checked, in order, when extracting an item's ID.
pub const ID_FIELDS: [&str; 5] = ["id", "ID", "phase_id", "decision_id", "feature_id"];

/// Fields checked, in order, when extracting an item's path.
pub const PATH_FIELDS: [&str; 4] = ["path", "file_path", "phase_path", "spec_path"];

/// Parsed stdin content.
#[derive(Debug, Clone, PartialEq)]
pub struct StdinInput {
    /// The bytes as read.
    pub raw: Vec<u8>,
    /// Whether the input was a JSON array.
    pub is_array: bool,
    /// One object per input item.
    pub items: Vec<Map<String, Value>>,
}

impl StdinInput {
    /// Returns one ID per item that has one.
    ///
    /// Each item contributes the first non-empty string among [`ID_FIELDS`].
    #[must_use]
    pub fn extract_ids(&self) -> Vec<String> {
        self.extract_first_of(&ID_FIELDS)
    }

    /// Returns one path per item that has one.
    ///
    /// Each item contributes the first non-empty string among [`PATH_FIELDS`].
    #[must_use]
    pub fn extract_paths(&self) -> Vec<String> {
        self.extract_first_of(&PATH_FIELDS)
    }

    /// Returns every non-empty string value of `field`.
    #[must_use]
    pub fn extract_field(&self, field: &str) -> Vec<String> {
        self.extract_first_of(&[field])
    }

    /// Returns the first ID, for single-item commands.
    pub fn extract_first_id(&self) -> Result<String> {
        self.extract_ids()
            .into_iter()
            .next()
            .ok_or_else(|| ComposeError::missing_field("ID"))
    }

    /// Returns the first path, for single-item commands.
    pub fn extract_first_path(&self) -> Result<String> {
        self.extract_paths()
            .into_iter()
            .next()
            .ok_or_else(|| ComposeError::missing_field("path"))
    }

    /// Returns the first non-empty string value of `field`.
    pub fn extract_first_string(&self, field: &str) -> Result<String> {
        self.extract_field(field)
            .into_iter()
            .next()
            .ok_or_else(|| ComposeError::missing_field(field))
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn extract_first_of(&self, fields: &[&str]) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| {
                fields.iter().find_map(|field| match item.get(*field) {
                    Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                    _ => None,
                })
            })
            .collect()
    }
}

/// Parses piped JSON.
///
/// Accepts an array of objects, a single object, or an array of strings
/// (each string becomes `{"id": s}`). `null` is an empty array.
pub fn parse_json_input(data: &[u8]) -> Result<StdinInput> {
    if let Ok(items) = serde_json::from_slice::<Option<Vec<Map<String, Value>>>>(data) {
        return Ok(StdinInput {
            raw: data.to_vec(),
            is_array: true,
            items: items.unwrap_or_default(),
        });
    }

    if let Ok(item) = serde_json::from_slice::<Map<String, Value>>(data) {
        return Ok(StdinInput {
            raw: data.to_vec(),
            is_array: false,
            items: vec![item],
        });
    }

    if let Ok(ids) = serde_json::from_slice::<Vec<String>>(data) {
        let items = ids
            .into_iter()
            .map(|id| {
                let mut item = Map::new();
                item.insert("id".to_string(), Value::String(id));
                item
            })
            .collect();
        return Ok(StdinInput {
            raw: data.to_vec(),
            is_array: true,
            items,
        });
    }

    Err(ComposeError::InvalidInput)
}

/// Reads all of `reader`, rejecting empty input.
pub fn read_input<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    if data.is_empty() {
        return Err(ComposeError::EmptyInput);
    }

    debug!(bytes = data.len(), "Read piped input");
    Ok(data)
}

/// Reads all of stdin. Fails when stdin is an interactive terminal.
pub fn read_stdin() -> Result<Vec<u8>> {
    if !has_stdin() {
        return Err(ComposeError::NotPiped);
    }
    read_input(io::stdin().lock())
}

/// Returns true if stdin is a pipe or file rather than a terminal.
#[must_use]
pub fn has_stdin() -> bool {
    !io::stdin().is_terminal()
}

/// Reads and parses stdin in one call.
pub fn read_and_parse_stdin() -> Result<StdinInput> {
    let data = read_stdin()?;
    parse_json_input(&data)
}

/// Joins values with newlines, for piping into `xargs`.
#[must_use]
pub fn format_as_lines<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders values as a compact JSON array.
pub fn format_as_json<S: AsRef<str>>(values: &[S]) -> Result<String> {
    let values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
    Ok(serde_json::to_string(&values)?)
}
