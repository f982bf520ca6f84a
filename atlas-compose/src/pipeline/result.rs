//! Pipeline execution results.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// The outcome of one pipeline run.
///
/// In stop-on-error mode a failed run carries exactly one entry in `errors`
/// and `completed_steps` counts the steps that succeeded before the failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    /// Number of steps in the pipeline.
    pub total_steps: usize,
    /// Number of steps that succeeded (or were simulated in a dry run).
    pub completed_steps: usize,
    /// Name of the failing step, if any.
    pub failed_step: Option<String>,
    /// Whether every executed step succeeded.
    pub success: bool,
    /// One message per failed step.
    pub errors: Vec<String>,
    /// Failures raised while compensating earlier steps.
    pub rollback_errors: Vec<String>,
    /// Wall-clock time of the run.
    #[serde(skip)]
    pub duration: Duration,
}

impl PipelineResult {
    /// Creates a successful, empty result for `total_steps` steps.
    #[must_use]
    pub fn new(total_steps: usize) -> Self {
        Self {
            total_steps,
            success: true,
            ..Self::default()
        }
    }

    /// Records a failed step.
    pub fn record_failure(&mut self, position: usize, name: &str, error: &str) {
        self.success = false;
        self.failed_step = Some(name.to_string());
        self.errors.push(format!("Step {position} ({name}): {error}"));
    }

    /// Records a failed rollback.
    pub fn record_rollback_failure(&mut self, position: usize, name: &str, error: &str) {
        self.rollback_errors
            .push(format!("Rollback {position} ({name}): {error}"));
    }

    /// Returns true if compensation did not complete cleanly.
    #[must_use]
    pub fn rollback_incomplete(&self) -> bool {
        !self.rollback_errors.is_empty()
    }

    /// Maps the run onto a process exit code.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.success)
    }

    /// Returns the duration in whole milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }

    /// Converts to the compact JSON map used in command output.
    #[must_use]
    pub fn to_compact_json(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("ok".to_string(), serde_json::json!(self.success));
        map.insert("total".to_string(), serde_json::json!(self.total_steps));
        map.insert("completed".to_string(), serde_json::json!(self.completed_steps));
        map.insert("duration".to_string(), serde_json::json!(self.duration_ms()));

        if !self.success {
            map.insert(
                "failed_step".to_string(),
                serde_json::json!(self.failed_step.clone().unwrap_or_default()),
            );
        }

        if !self.errors.is_empty() {
            map.insert("errors".to_string(), serde_json::json!(self.errors));
        }

        if !self.rollback_errors.is_empty() {
            map.insert(
                "rollback_errors".to_string(),
                serde_json::json!(self.rollback_errors),
            );
        }

        map
    }
}
