//! Step pipelines.
//!
//! This module provides:
//! - Named steps with async operations and optional rollbacks
//! - Sequential execution with stop-on-error or continue-on-error policies
//! - Reverse-order compensation of completed steps
//! - Dry runs and change previews

mod dry_run;
mod executor;
mod options;
mod result;
mod step;


pub use dry_run::DryRunChanges;
pub use executor::Pipeline;
pub use options::PipelineOptions;
pub use result::PipelineResult;
pub use step::{action, FnAction, PipelineStep, StepAction};
