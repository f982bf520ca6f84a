//! Progress reporting for batch runs.

use parking_lot::RwLock;
use std::io::Write;
use tracing::{debug, info, Level};

/// Formats one progress line: `[current/total] (pct%) Processing: item`.
#[must_use]
pub fn format_progress(current: usize, total: usize, item: &str) -> String {
    let percentage = if total == 0 {
        100.0
    } else {
        current as f64 / total as f64 * 100.0
    };
    format!("[{current}/{total}] ({percentage:.1}%) Processing: {item}")
}

/// Receives a notification after each item is accounted for.
///
/// Reporting is a side effect only and must never fail the batch.
pub trait ProgressReporter: Send + Sync {
    /// Reports that `current` of `total` items are done, `item` being the latest.
    fn report(&self, current: usize, total: usize, item: &str);
}

/// Writes progress lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrProgressReporter;

impl ProgressReporter for StderrProgressReporter {
    fn report(&self, current: usize, total: usize, item: &str) {
        let line = format_progress(current, total, item);
        // Best effort.
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }
}

/// A reporter that discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report(&self, _current: usize, _total: usize, _item: &str) {}
}

/// Emits progress through the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingProgressReporter {
    level: Level,
}

impl Default for LoggingProgressReporter {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingProgressReporter {
    /// Creates a logging reporter at the given level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level reporter.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl ProgressReporter for LoggingProgressReporter {
    fn report(&self, current: usize, total: usize, item: &str) {
        if self.level == Level::DEBUG {
            debug!(current, total, item, "Batch progress");
        } else {
            info!(current, total, item, "Batch progress");
        }
    }
}

/// A reporter that keeps every notification, for tests.
#[derive(Debug, Default)]
pub struct CollectingProgressReporter {
    events: RwLock<Vec<(usize, usize, String)>>,
}

impl CollectingProgressReporter {
    /// Creates an empty collecting reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `(current, total, item)` seen so far.
    #[must_use]
    pub fn events(&self) -> Vec<(usize, usize, String)> {
        self.events.read().clone()
    }

    /// Returns the formatted lines a stderr reporter would have printed.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events
            .read()
            .iter()
            .map(|(current, total, item)| format_progress(*current, *total, item))
            .collect()
    }

    /// Returns the number of notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl ProgressReporter for CollectingProgressReporter {
    fn report(&self, current: usize, total: usize, item: &str) {
        self.events.write().push((current, total, item.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_progress() {
        assert_eq!(format_progress(1, 3, "a"), "[1/3] (33.3%) Processing: a");
        assert_eq!(format_progress(3, 3, "c"), "[3/3] (100.0%) Processing: c");
        assert_eq!(format_progress(1, 8, "x"), "[1/8] (12.5%) Processing: x");
    }

    #[test]
    fn test_noop_and_stderr_reporters() {
        NoOpProgressReporter.report(1, 2, "item");
        StderrProgressReporter.report(2, 2, "item");
        LoggingProgressReporter::debug().report(1, 1, "item");
        // Should not panic
    }

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingProgressReporter::new();
        assert!(reporter.is_empty());

        reporter.report(1, 2, "first");
        reporter.report(2, 2, "second");

        assert_eq!(reporter.len(), 2);
        assert_eq!(
            reporter.lines(),
            vec![
                "[1/2] (50.0%) Processing: first".to_string(),
                "[2/2] (100.0%) Processing: second".to_string(),
            ]
        );
    }
}
