//! Mock step actions for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::pipeline::StepAction;

/// An ordered log shared between actions, used to assert call order.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns all entries in call order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Clears the log.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// An action that counts calls and returns a configurable outcome.
#[derive(Debug)]
pub struct MockAction {
    label: String,
    error: Mutex<Option<String>>,
    call_count: Mutex<usize>,
    log: Option<CallLog>,
}

impl MockAction {
    /// Creates an action that succeeds.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            error: Mutex::new(None),
            call_count: Mutex::new(0),
            log: None,
        }
    }

    /// Creates an action that fails with `error`.
    #[must_use]
    pub fn failing(label: impl Into<String>, error: impl Into<String>) -> Self {
        let action = Self::new(label);
        *action.error.lock() = Some(error.into());
        action
    }

    /// Records the label into `log` on every call.
    #[must_use]
    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    /// Makes later calls fail with `error`.
    pub fn set_error(&self, error: impl Into<String>) {
        *self.error.lock() = Some(error.into());
    }

    /// Makes later calls succeed.
    pub fn clear_error(&self) {
        *self.error.lock() = None;
    }

    /// Returns the number of times the action ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }

    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wraps the action for use in a step, keeping a handle for assertions.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl StepAction for MockAction {
    async fn run(&self) -> anyhow::Result<()> {
        *self.call_count.lock() += 1;
        if let Some(log) = &self.log {
            log.record(&self.label);
        }
        match self.error.lock().clone() {
            Some(error) => Err(anyhow::anyhow!(error)),
            None => Ok(()),
        }
    }
}

/// An action that sleeps before succeeding.
#[derive(Debug)]
pub struct SlowAction {
    delay: Duration,
}

impl SlowAction {
    /// Creates a slow action.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates a slow action with a delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

#[async_trait]
impl StepAction for SlowAction {
    async fn run(&self) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// An action that panics with a fixed message.
#[derive(Debug)]
pub struct PanickingAction {
    message: String,
}

impl PanickingAction {
    /// Creates a panicking action.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl StepAction for PanickingAction {
    async fn run(&self) -> anyhow::Result<()> {
        panic!("{}", self.message);
    }
}
