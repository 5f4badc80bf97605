//! Testing utilities for Stratum.
//!
//! This module provides helpers to make testing middleware, controllers,
//! and whole layered applications easier.
//!
//! # Features
//!
//! - [`MemoryLogger`]: A logger that keeps every entry for inspection
//! - [`RecordingMiddleware`]: A middleware that records the events it sees
//! - [`FailingMiddleware`]: A middleware that always rejects
//! - [`Journal`]: A shared, ordered log of step labels

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use stratum_core::{BoxError, Event, EventId, LogContext, LogLevel, Logger, Middleware};

// ============================================================================
// Memory Logger
// ============================================================================

/// One captured log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
    /// Structured context.
    pub context: LogContext,
}

/// A logger that records every entry.
///
/// # Example
///
/// ```rust
/// use stratum_core::{LogContext, LogLevel, Logger};
/// use stratum_std::testing::MemoryLogger;
///
/// let logger = MemoryLogger::new();
/// logger.warning("disk almost full", &LogContext::new());
/// assert_eq!(logger.count_at(LogLevel::Warning), 1);
/// assert!(logger.contains("disk"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every entry so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Number of entries at exactly `level`.
    pub fn count_at(&self, level: LogLevel) -> usize {
        self.entries.lock().iter().filter(|e| e.level == level).count()
    }

    /// Returns `true` if any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.lock().iter().any(|e| e.message.contains(needle))
    }

    /// Discard everything recorded.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str, context: &LogContext) {
        self.entries.lock().push(LogEntry {
            level,
            message: message.to_string(),
            context: context.clone(),
        });
    }
}

// ============================================================================
// Journal
// ============================================================================

/// An ordered record of step labels shared between test components.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line.
    pub fn record(&self, line: impl Into<String>) {
        self.lines.lock().push(line.into());
    }

    /// A copy of every line so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

// ============================================================================
// Recording Middleware
// ============================================================================

/// A middleware that records every event it sees and lets it through.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = Arc::new(RecordingMiddleware::new("audit"));
/// scope.register_value(&AUDIT, recorder.clone());
///
/// // dispatch...
///
/// assert_eq!(recorder.count(), 1);
/// ```
#[derive(Debug)]
pub struct RecordingMiddleware {
    label: String,
    seen: Mutex<Vec<EventId>>,
    journal: Option<Journal>,
}

impl RecordingMiddleware {
    /// A recorder with its own private log.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            seen: Mutex::new(Vec::new()),
            journal: None,
        }
    }

    /// A recorder that also writes its label to `journal` on each event.
    pub fn with_journal(label: impl Into<String>, journal: Journal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::new(label)
        }
    }

    /// Ids of the events seen, in order.
    pub fn events(&self) -> Vec<EventId> {
        self.seen.lock().clone()
    }

    /// Number of events seen.
    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }
}

impl Middleware for RecordingMiddleware {
    async fn before(&self, event: &Event) -> Result<(), BoxError> {
        self.seen.lock().push(event.id());
        if let Some(journal) = &self.journal {
            journal.record(self.label.clone());
        }
        Ok(())
    }
}

// ============================================================================
// Failing Middleware
// ============================================================================

/// A middleware that rejects every event with a fixed reason.
#[derive(Debug)]
pub struct FailingMiddleware {
    reason: String,
    attempts: AtomicUsize,
}

impl FailingMiddleware {
    /// Reject with `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            attempts: AtomicUsize::new(0),
        }
    }

    /// How many events were rejected.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Middleware for FailingMiddleware {
    async fn before(&self, _event: &Event) -> Result<(), BoxError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(self.reason.clone().into())
    }
}
