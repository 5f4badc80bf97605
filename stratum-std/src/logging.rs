//! Logger backends.
//!
//! With the `tracing` feature (on by default) [`TracingLogger`] forwards
//! every entry to the `tracing` ecosystem; install a subscriber such as
//! `tracing-subscriber` to see the output. Without it the framework falls
//! back to [`NoopLogger`].

use std::sync::Arc;
use stratum_core::{Logger, NoopLogger};

#[cfg(feature = "tracing")]
use stratum_core::{LogContext, LogLevel};

/// A [`Logger`] that emits `tracing` events under the `stratum` target.
///
/// Syslog levels collapse onto tracing's five; the syslog level is kept
/// in the `severity` field and the context is rendered as JSON.
#[cfg(feature = "tracing")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

#[cfg(feature = "tracing")]
impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &LogContext) {
        let context = serde_json::to_string(context).unwrap_or_default();
        match level {
            LogLevel::Debug => {
                tracing::debug!(target: "stratum", severity = %level, %context, "{message}")
            }
            LogLevel::Info | LogLevel::Notice => {
                tracing::info!(target: "stratum", severity = %level, %context, "{message}")
            }
            LogLevel::Warning => {
                tracing::warn!(target: "stratum", severity = %level, %context, "{message}")
            }
            LogLevel::Error | LogLevel::Critical | LogLevel::Alert | LogLevel::Emergency => {
                tracing::error!(target: "stratum", severity = %level, %context, "{message}")
            }
        }
    }
}

/// The logger used when an application is not given one.
pub fn default_logger() -> Arc<dyn Logger> {
    #[cfg(feature = "tracing")]
    {
        Arc::new(TracingLogger)
    }
    #[cfg(not(feature = "tracing"))]
    {
        Arc::new(NoopLogger)
    }
}

/// A logger that discards everything, as a shared handle.
pub fn silent_logger() -> Arc<dyn Logger> {
    Arc::new(NoopLogger)
}

#[cfg(all(test, feature = "tracing"))]
mod tests {
    use super::*;
    use stratum_core::log_context;

    #[test]
    fn test_tracing_logger_without_subscriber() {
        let logger = TracingLogger;
        for level in [LogLevel::Debug, LogLevel::Notice, LogLevel::Warning, LogLevel::Alert] {
            logger.log(level, "level check", &log_context! { "level" => level.to_string() });
        }
    }
}
