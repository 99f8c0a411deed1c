//! Runtime log level control for MCP `logging/setLevel` requests.

use rmcp::model::LoggingLevel;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Handle to the reloadable filter installed by the binary.
pub type LogLevelHandle = reload::Handle<EnvFilter, Registry>;

/// Map an MCP logging level onto a tracing filter directive.
///
/// Levels tracing has no equivalent for collapse onto the nearest one.
pub fn filter_directive(level: LoggingLevel) -> &'static str {
    match level {
        LoggingLevel::Debug => "debug",
        LoggingLevel::Info | LoggingLevel::Notice => "info",
        LoggingLevel::Warning => "warn",
        LoggingLevel::Error
        | LoggingLevel::Critical
        | LoggingLevel::Alert
        | LoggingLevel::Emergency => "error",
    }
}

/// Replace the active filter with one for `level`.
pub fn apply_level(handle: &LogLevelHandle, level: LoggingLevel) -> Result<(), reload::Error> {
    handle.reload(EnvFilter::new(filter_directive(level)))
}
