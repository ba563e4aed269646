//! Process-wide logging setup shared by every front end of the banking core.

/// Tracing subscriber configuration (filters, formatting).
pub mod tracing;

pub use crate::tracing::{DEFAULT_FILTER, LogFormat};

/// Initialize process-wide logging with JSON output.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::Json);
}
