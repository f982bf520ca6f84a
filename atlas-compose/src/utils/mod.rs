//! Small helpers shared by the batch and pipeline engines.

use uuid::Uuid;

/// Generates a random run identifier for log correlation.
#[must_use]
pub fn generate_run_id() -> Uuid {
    Uuid::new_v4()
}

/// Renders a caught panic payload as an error message.
pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("operation panicked: {detail}")
}
