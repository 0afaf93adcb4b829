//! Tracing/logging setup shared by the binaries.

pub mod tracing;

/// Log output format for the process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact human-readable lines (operator terminals).
    #[default]
    Compact,
    /// One JSON object per line (log shippers).
    Json,
}

/// Initialize process-wide observability (tracing/logging).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}
