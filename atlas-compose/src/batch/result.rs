//! Aggregate batch results.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Records the failure of a single item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchError<T> {
    /// Position of the item in the input.
    pub index: usize,
    /// The item that failed.
    pub item: T,
    /// The stringified error.
    pub error: String,
}

impl<T> BatchError<T> {
    /// Creates a new batch error.
    #[must_use]
    pub fn new(index: usize, item: T, error: impl Into<String>) -> Self {
        Self {
            index,
            item,
            error: error.into(),
        }
    }
}

/// The outcome of one batch run.
///
/// `processed == succeeded + failed` always holds. `processed` is below
/// `total_items` only when a stop-on-error run halted early.
#[derive(Debug, Clone)]
pub struct BatchResult<T, R> {
    /// Number of items handed to the processor.
    pub total_items: usize,
    /// Number of items accounted for.
    pub processed: usize,
    /// Number of items whose operation succeeded.
    pub succeeded: usize,
    /// Number of items whose operation failed.
    pub failed: usize,
    /// Successful outputs, ordered by input position.
    pub results: Vec<R>,
    /// Failures, ordered by input position.
    pub errors: Vec<BatchError<T>>,
    /// Wall-clock time of the run.
    pub duration: Duration,
}

impl<T, R> BatchResult<T, R> {
    /// Creates an empty result for `total_items` inputs.
    #[must_use]
    pub fn new(total_items: usize) -> Self {
        Self {
            total_items,
            processed: 0,
            succeeded: 0,
            failed: 0,
            results: Vec::with_capacity(total_items),
            errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Returns true if any item failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }

    /// Returns true if the run stopped before accounting for every item.
    #[must_use]
    pub fn halted_early(&self) -> bool {
        self.processed < self.total_items
    }

    /// Maps the run onto a process exit code.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.has_errors())
    }

    /// Returns the duration in whole milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

impl<T: Serialize, R: Serialize> BatchResult<T, R> {
    /// Converts to the compact JSON map used in command output.
    ///
    /// `results` and `errors` are only present when non-empty.
    #[must_use]
    pub fn to_compact_json(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("total".to_string(), serde_json::json!(self.total_items));
        map.insert("processed".to_string(), serde_json::json!(self.processed));
        map.insert("succeeded".to_string(), serde_json::json!(self.succeeded));
        map.insert("failed".to_string(), serde_json::json!(self.failed));
        map.insert("duration".to_string(), serde_json::json!(self.duration_ms()));

        if !self.results.is_empty() {
            map.insert("results".to_string(), serde_json::json!(self.results));
        }

        if !self.errors.is_empty() {
            map.insert(
                "errors".to_string(),
                serde_json::json!(self
                    .errors
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "index": e.index,
                            "item": e.item,
                            "error": e.error,
                        })
                    })
                    .collect::<Vec<_>>()),
            );
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> BatchResult<String, String> {
        BatchResult {
            total_items: 10,
            processed: 10,
            succeeded: 8,
            failed: 2,
            results: vec!["res1".to_string(), "res2".to_string()],
            errors: vec![BatchError::new(1, "item1".to_string(), "error1")],
            duration: Duration::from_millis(100),
        }
    }

    #[test]
    fn test_to_compact_json() {
        let json = sample().to_compact_json();

        assert_eq!(json["total"], serde_json::json!(10));
        assert_eq!(json["succeeded"], serde_json::json!(8));
        assert_eq!(json["duration"], serde_json::json!(100));
        assert_eq!(json["results"], serde_json::json!(["res1", "res2"]));
        assert_eq!(
            json["errors"],
            serde_json::json!([{"index": 1, "item": "item1", "error": "error1"}])
        );
    }

    #[test]
    fn test_compact_json_omits_empty_collections() {
        let result: BatchResult<String, String> = BatchResult::new(0);
        let json = result.to_compact_json();

        assert!(!json.contains_key("results"));
        assert!(!json.contains_key("errors"));
        assert_eq!(json.len(), 5);
    }

    #[test]
    fn test_compact_json_is_deterministic() {
        let result = sample();
        assert_eq!(result.to_compact_json(), result.to_compact_json());
    }

    #[test]
    fn test_has_errors_and_exit_code() {
        let mut result: BatchResult<String, String> = BatchResult::new(1);
        assert!(!result.has_errors());
        assert_eq!(result.exit_code(), 0);

        result.failed = 1;
        assert!(result.has_errors());
        assert_eq!(result.exit_code(), 1);
    }
}
