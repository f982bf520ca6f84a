//! Sequential pipeline execution with compensating rollback.

use super::step::{PipelineStep, StepAction};
use super::{PipelineOptions, PipelineResult};
use crate::utils::{generate_run_id, panic_message};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// An ordered list of named steps run as one unit.
///
/// With `stop_on_error` (the default) the first failure halts the run and
/// every step that already succeeded is rolled back, newest first. With it
/// off every step runs and nothing is rolled back.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    dry_run: bool,
    stop_on_error: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_options(&PipelineOptions::default())
    }
}

impl Pipeline {
    /// Creates an empty pipeline that stops on the first error.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty pipeline with the given policy.
    #[must_use]
    pub fn from_options(options: &PipelineOptions) -> Self {
        Self {
            steps: Vec::new(),
            dry_run: options.dry_run,
            stop_on_error: options.stop_on_error,
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn add_step(
        mut self,
        name: impl Into<String>,
        operation: Arc<dyn StepAction>,
        rollback: Option<Arc<dyn StepAction>>,
    ) -> Self {
        self.steps.push(PipelineStep::new(name, operation, rollback));
        self
    }

    /// Appends a prepared step.
    #[must_use]
    pub fn with_step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Sets dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the stop-on-error policy.
    #[must_use]
    pub fn with_stop_on_error(mut self, stop_on_error: bool) -> Self {
        self.stop_on_error = stop_on_error;
        self
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns the step names in order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns true in dry-run mode.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns true if the first failure halts the run.
    #[must_use]
    pub fn stops_on_error(&self) -> bool {
        self.stop_on_error
    }

    /// Runs the pipeline.
    ///
    /// Step failures, including panics, are reported in the result.
    pub async fn execute(&self) -> PipelineResult {
        let start = Instant::now();
        let run_id = generate_run_id();
        let span = info_span!(
            "pipeline",
            %run_id,
            steps = self.steps.len(),
            dry_run = self.dry_run,
            stop_on_error = self.stop_on_error,
        );

        async move {
            let mut result = if self.dry_run {
                self.simulate()
            } else if self.stop_on_error {
                self.execute_with_rollback().await
            } else {
                self.execute_all().await
            };

            result.duration = start.elapsed();
            info!(
                success = result.success,
                completed = result.completed_steps,
                duration_ms = result.duration_ms(),
                "Pipeline finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    fn simulate(&self) -> PipelineResult {
        for (index, step) in self.steps.iter().enumerate() {
            debug!(position = index + 1, step = %step.name, "Dry run: would execute step");
        }
        let mut result = PipelineResult::new(self.steps.len());
        result.completed_steps = self.steps.len();
        result
    }

    async fn execute_with_rollback(&self) -> PipelineResult {
        let mut result = PipelineResult::new(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            debug!(position = index + 1, step = %step.name, "Executing step");

            if let Err(message) = run_guarded(step.operation.as_ref()).await {
                warn!(position = index + 1, step = %step.name, error = %message, "Step failed");
                result.record_failure(index + 1, &step.name, &message);
                self.rollback(index, &mut result).await;
                return result;
            }

            result.completed_steps += 1;
        }

        result
    }

    async fn execute_all(&self) -> PipelineResult {
        let mut result = PipelineResult::new(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            debug!(position = index + 1, step = %step.name, "Executing step");

            match run_guarded(step.operation.as_ref()).await {
                Ok(()) => result.completed_steps += 1,
                Err(message) => {
                    warn!(position = index + 1, step = %step.name, error = %message, "Step failed");
                    result.record_failure(index + 1, &step.name, &message);
                }
            }
        }

        result
    }

    /// Rolls back the steps before `failed_index`, newest first.
    ///
    /// A failed rollback is recorded and the remaining ones still run.
    async fn rollback(&self, failed_index: usize, result: &mut PipelineResult) {
        for (index, step) in self.steps[..failed_index].iter().enumerate().rev() {
            let Some(rollback) = &step.rollback else {
                continue;
            };

            debug!(position = index + 1, step = %step.name, "Rolling back step");
            if let Err(message) = run_guarded(rollback.as_ref()).await {
                warn!(position = index + 1, step = %step.name, error = %message, "Rollback failed");
                result.record_rollback_failure(index + 1, &step.name, &message);
            }
        }
    }
}

/// Runs an action, turning errors and panics into messages.
///
/// Hand-written actions may panic before returning their future, so the
/// call itself is guarded as well as the poll.
async fn run_guarded(action: &dyn StepAction) -> Result<(), String> {
    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| action.run())) {
        Ok(future) => future,
        Err(panic) => return Err(panic_message(panic.as_ref())),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(panic) => Err(panic_message(panic.as_ref())),
    }
}
