//! Batch processing.
//!
//! This module provides:
//! - Sequential and worker-pool execution of one operation over many items
//! - Continue-on-error and stop-on-first-error policies
//! - Progress reporting
//! - Aggregate results with compact JSON output

mod adapters;
mod options;
mod processor;
mod progress;
mod result;

pub use adapters::{batch_process_ids, batch_process_paths};
pub use options::{BatchOptions, DEFAULT_WORKERS};
pub use processor::BatchProcessor;
pub use progress::{
    format_progress, CollectingProgressReporter, LoggingProgressReporter,
    NoOpProgressReporter, ProgressReporter, StderrProgressReporter,
};
pub use result::{BatchError, BatchResult};
