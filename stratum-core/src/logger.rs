//! Logger contract.
//!
//! The framework logs through [`Logger`] so an application can plug in any
//! backend. Levels follow the syslog ladder, from `debug` up to
//! `emergency`. Every call carries a structured [`LogContext`].
//! [`NoopLogger`] is always available; the framework must work with it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// Structured context attached to a log call.
pub type LogContext = BTreeMap<String, Value>;

/// Severity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Normal but significant.
    Notice,
    /// Something looks wrong.
    Warning,
    /// An operation failed.
    Error,
    /// A component is unusable.
    Critical,
    /// Immediate action required.
    Alert,
    /// The system is unusable.
    Emergency,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Notice => "notice",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::Alert => "alert",
            LogLevel::Emergency => "emergency",
        };
        f.write_str(name)
    }
}

/// A leveled, structured logger.
pub trait Logger: Send + Sync + 'static {
    /// Record one entry.
    fn log(&self, level: LogLevel, message: &str, context: &LogContext);

    /// Log at [`LogLevel::Debug`].
    fn debug(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Debug, message, context);
    }

    /// Log at [`LogLevel::Info`].
    fn info(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Info, message, context);
    }

    /// Log at [`LogLevel::Notice`].
    fn notice(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Notice, message, context);
    }

    /// Log at [`LogLevel::Warning`].
    fn warning(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Warning, message, context);
    }

    /// Log at [`LogLevel::Error`].
    fn error(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Error, message, context);
    }

    /// Log at [`LogLevel::Critical`].
    fn critical(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Critical, message, context);
    }

    /// Log at [`LogLevel::Alert`].
    fn alert(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Alert, message, context);
    }

    /// Log at [`LogLevel::Emergency`].
    fn emergency(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Emergency, message, context);
    }
}

/// A logger that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: LogLevel, _message: &str, _context: &LogContext) {}
}

/// Build a [`LogContext`] from `key => value` pairs.
///
/// ```rust
/// use stratum_core::log_context;
///
/// let ctx = log_context! { "route" => "/users", "attempt" => 2 };
/// assert_eq!(ctx["attempt"], 2);
/// ```
#[macro_export]
macro_rules! log_context {
    () => {
        $crate::LogContext::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut ctx = $crate::LogContext::new();
        $(
            ctx.insert(::std::string::String::from($key), $crate::__private::serde_json::json!($value));
        )+
        ctx
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::Emergency);
        assert_eq!(LogLevel::Warning.to_string(), "warning");
    }

    #[test]
    fn test_noop_logger_accepts_everything() {
        let logger = NoopLogger;
        logger.emergency("nothing happens", &log_context! { "k" => "v" });
        logger.debug("still nothing", &LogContext::new());
    }
}
