//! # Atlas Compose
//!
//! Composition primitives for the atlas developer tooling.
//!
//! - **Batch processing**: apply one async operation to many items, one by
//!   one or on a bounded worker pool, with continue-on-error or
//!   stop-at-first-failure policies and progress reporting
//! - **Pipelines**: ordered named steps with compensating rollbacks that run
//!   in reverse when a later step fails, plus dry runs
//! - **Piped input and compact output**: JSON on stdin in, single-line JSON out
//! - **Exit codes**: map results onto process exit statuses
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use atlas_compose::prelude::*;
//!
//! let input = read_and_parse_stdin()?;
//! let result = batch_process_ids(
//!     input.extract_ids(),
//!     |id| async move { complete_phase(&id).await },
//!     BatchOptions::new().with_parallel(true).with_continue_on_error(true),
//! )
//! .await;
//!
//! output::success(result.to_compact_json())?;
//! std::process::exit(result.exit_code());
//! ```
//!
//! ```rust,ignore
//! let result = Pipeline::new()
//!     .add_step("backup", action(|| async { backup().await }), Some(action(|| async { restore().await })))
//!     .add_step("migrate", action(|| async { migrate().await }), None)
//!     .execute()
//!     .await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod batch;
pub mod config;
pub mod errors;
pub mod exit;
pub mod input;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::batch::{
        batch_process_ids, batch_process_paths, BatchError, BatchOptions, BatchProcessor,
        BatchResult, ProgressReporter,
    };
    pub use crate::config::ComposeConfig;
    pub use crate::errors::{ComposeError, Result};
    pub use crate::exit::{exit_code_from_error, exit_code_from_result, propagate_exit_code};
    pub use crate::input::{parse_json_input, read_and_parse_stdin, StdinInput};
    pub use crate::logging::{init_logging, LoggingConfig};
    pub use crate::output;
    pub use crate::pipeline::{
        action, DryRunChanges, Pipeline, PipelineOptions, PipelineResult, PipelineStep,
        StepAction,
    };
}
