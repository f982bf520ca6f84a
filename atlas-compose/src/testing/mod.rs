//! Testing utilities for batches and pipelines.
//!
//! This module provides:
//! - Mock step actions with call counting and shared call-order logs
//! - Assertions for batch and pipeline results
//!
//! A collecting progress reporter lives in [`crate::batch`].

mod assertions;
mod mocks;

pub use crate::batch::CollectingProgressReporter;
pub use assertions::{
    assert_batch_complete, assert_batch_counts, assert_pipeline_failed_at,
    assert_pipeline_succeeded,
};
pub use mocks::{CallLog, MockAction, PanickingAction, SlowAction};
