//! Pipeline steps and the actions they run.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;

/// An async unit of work: a step's operation or its rollback.
#[async_trait]
pub trait StepAction: Send + Sync {
    /// Runs the action.
    async fn run(&self) -> anyhow::Result<()>;
}

type BoxedActionFn = Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// An action backed by an async closure.
pub struct FnAction {
    func: BoxedActionFn,
}

impl FnAction {
    /// Wraps an async closure.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            func: Box::new(move || func().boxed()),
        }
    }
}

impl Debug for FnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").finish_non_exhaustive()
    }
}

#[async_trait]
impl StepAction for FnAction {
    async fn run(&self) -> anyhow::Result<()> {
        (self.func)().await
    }
}

/// Wraps an async closure as a shareable [`StepAction`].
///
/// ```rust,ignore
/// let op = action(|| async { anyhow::Ok(()) });
/// ```
pub fn action<F, Fut>(func: F) -> Arc<dyn StepAction>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnAction::new(func))
}

/// A named step with an optional compensating rollback.
#[derive(Clone)]
pub struct PipelineStep {
    /// The step name, used in error messages and results.
    pub name: String,
    /// The work performed by the step.
    pub operation: Arc<dyn StepAction>,
    /// Undoes the operation when a later step fails.
    pub rollback: Option<Arc<dyn StepAction>>,
}

impl PipelineStep {
    /// Creates a new step.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        operation: Arc<dyn StepAction>,
        rollback: Option<Arc<dyn StepAction>>,
    ) -> Self {
        Self {
            name: name.into(),
            operation,
            rollback,
        }
    }

    /// Returns true if the step can be compensated.
    #[must_use]
    pub fn has_rollback(&self) -> bool {
        self.rollback.is_some()
    }
}

impl Debug for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineStep")
            .field("name", &self.name)
            .field("has_rollback", &self.has_rollback())
            .finish()
    }
}
