//! Batch processing options.

use serde::{Deserialize, Serialize};

/// Number of workers used when none is configured.
pub const DEFAULT_WORKERS: usize = 4;

/// Configures batch processing behavior.
///
/// A `workers` value of zero means "unset"; [`BatchProcessor::new`] replaces
/// it with [`DEFAULT_WORKERS`].
///
/// [`BatchProcessor::new`]: super::BatchProcessor::new
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Process items on a worker pool instead of one by one.
    pub parallel: bool,
    /// Keep going after an item fails.
    pub continue_on_error: bool,
    /// Report progress after every item.
    pub show_progress: bool,
    /// Number of parallel workers.
    pub workers: usize,
}

impl BatchOptions {
    /// Creates options with everything disabled and workers unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the worker pool.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets whether processing continues past failed items.
    #[must_use]
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Enables or disables progress reporting.
    #[must_use]
    pub fn with_show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Sets the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Returns a copy with an unset worker count replaced by the default.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.workers == 0 {
            self.workers = DEFAULT_WORKERS;
        }
        self
    }
}
