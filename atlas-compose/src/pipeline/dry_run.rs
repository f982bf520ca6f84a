//! Previews of a single change.

use serde::Serialize;
use std::collections::HashMap;

/// Describes a change a command would make, without making it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryRunChanges<V> {
    /// The operation that would run.
    pub operation: String,
    /// The current value.
    pub before: V,
    /// The value after the operation.
    pub after: V,
    /// Whether the value would change at all.
    pub will_change: bool,
}

impl<V: PartialEq> DryRunChanges<V> {
    /// Creates a preview, comparing `before` and `after`.
    #[must_use]
    pub fn new(operation: impl Into<String>, before: V, after: V) -> Self {
        let will_change = before != after;
        Self {
            operation: operation.into(),
            before,
            after,
            will_change,
        }
    }
}

impl<V: Serialize> DryRunChanges<V> {
    /// Converts to `{op, before, after, change}`.
    #[must_use]
    pub fn to_compact_json(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("op".to_string(), serde_json::json!(self.operation));
        map.insert("before".to_string(), serde_json::json!(self.before));
        map.insert("after".to_string(), serde_json::json!(self.after));
        map.insert("change".to_string(), serde_json::json!(self.will_change));
        map
    }
}
