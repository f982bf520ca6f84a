//! Test assertions for batch and pipeline results.

use crate::batch::BatchResult;
use crate::pipeline::PipelineResult;

/// Asserts that the pipeline run succeeded.
pub fn assert_pipeline_succeeded(result: &PipelineResult) {
    assert!(
        result.success,
        "Expected success, got errors: {:?}",
        result.errors
    );
}

/// Asserts that the pipeline run failed at the named step.
pub fn assert_pipeline_failed_at(result: &PipelineResult, step: &str) {
    assert!(!result.success, "Expected failure at '{step}', got success");
    assert_eq!(
        result.failed_step.as_deref(),
        Some(step),
        "Expected failed step '{}', got {:?}",
        step,
        result.failed_step
    );
}

/// Asserts the success and failure counts of a batch run.
pub fn assert_batch_counts<T, R>(result: &BatchResult<T, R>, succeeded: usize, failed: usize) {
    assert_eq!(
        (result.succeeded, result.failed),
        (succeeded, failed),
        "Expected {} succeeded / {} failed, got {} / {}",
        succeeded,
        failed,
        result.succeeded,
        result.failed
    );
    assert_eq!(
        result.processed,
        succeeded + failed,
        "Expected processed to equal succeeded + failed"
    );
}

/// Asserts that every item of a batch run succeeded.
pub fn assert_batch_complete<T, R>(result: &BatchResult<T, R>) {
    assert_batch_counts(result, result.total_items, 0);
    assert_eq!(result.results.len(), result.total_items);
}
