//! Error types for Stratum.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`StratumError`] - Top-level error type for all Stratum operations
//! - [`AssemblyError`] - Fatal errors while building an application
//! - [`ResolveError`] - Dependency scope lookups
//! - [`DispatchError`] - Per-event routing and delegation errors
//! - [`SourceError`] - Event source start/stop failures
//! - [`ExtractError`] - Parameter projection failures

use crate::response::ErrorKind;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Stratum operations.
#[derive(Error, Debug)]
pub enum StratumError {
    /// Application construction failed.
    #[error("assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// An event could not be dispatched.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A dependency could not be resolved.
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// An event source failed to start or stop.
    #[error("event source error: {0}")]
    Source(#[from] SourceError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Fatal errors raised while assembling an application.
///
/// These stop construction entirely; ambiguous routing or a missing
/// dependency must never reach request handling.
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// Two routes were registered with an identical pattern.
    #[error("duplicate route `{pattern}` declared by `{first}` and `{second}`")]
    DuplicateRoute {
        /// The offending pattern.
        pattern: String,
        /// Handler that registered it first.
        first: String,
        /// Handler that tried to register it again.
        second: String,
    },

    /// A component's dependency could not be resolved.
    #[error("cannot assemble `{component}`")]
    Unresolved {
        /// The component being assembled (controller, middleware, ...).
        component: String,
        /// The underlying lookup failure.
        #[source]
        source: ResolveError,
    },

    /// The application was built without an event source.
    #[error("application `{0}` has no event source")]
    MissingEventSource(String),
}

/// Errors raised by dependency scope lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No scope in the chain has a binding for the token.
    #[error("unresolved token `{token}` (searched: {})", chain.join(" -> "))]
    UnresolvedToken {
        /// The token name.
        token: String,
        /// Names of the scopes searched, innermost first.
        chain: Vec<String>,
    },

    /// A binding exists but holds a different type than requested.
    #[error("token `{token}` is bound to `{found}`, expected `{expected}`")]
    TypeMismatch {
        /// The token name.
        token: String,
        /// The requested type.
        expected: &'static str,
        /// The registered type.
        found: &'static str,
    },

    /// A factory or class constructor failed.
    #[error("failed to construct `{token}`: {message}")]
    Construction {
        /// The token name.
        token: String,
        /// What went wrong.
        message: String,
    },
}

impl ResolveError {
    /// Build a [`ResolveError::Construction`] from any displayable failure.
    pub fn construction(token: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ResolveError::Construction {
            token: token.into(),
            message: err.to_string(),
        }
    }
}

/// Per-event errors.
///
/// Only [`DispatchError::RouteNotFound`] and
/// [`DispatchError::NoDispatcherBound`] are returned from dispatching
/// itself; the other variants are recorded on the event's response stack.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No route matches the selector.
    #[error("no route matches `{selector}`")]
    RouteNotFound {
        /// The selector that failed to match.
        selector: String,
    },

    /// A middleware step failed.
    #[error("middleware `{middleware}` rejected the event: {reason}")]
    MiddlewareRejected {
        /// `Type::method` of the failing step.
        middleware: String,
        /// The step's failure message.
        reason: String,
    },

    /// A delegate event source was used before a dispatcher was bound.
    #[error("no dispatcher bound to the delegate event source (was the inner layer started?)")]
    NoDispatcherBound,

    /// The handler failed.
    #[error("handler `{handler}` failed: {message}")]
    HandlerFailed {
        /// `Controller::method` of the handler.
        handler: String,
        /// The failure message.
        message: String,
    },

    /// A controller or middleware could not be resolved at first use.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Parameter projection failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl DispatchError {
    /// The response-stack classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::RouteNotFound { .. } => ErrorKind::RouteNotFound,
            DispatchError::MiddlewareRejected { .. } => ErrorKind::MiddlewareRejected,
            DispatchError::NoDispatcherBound => ErrorKind::NoDispatcherBound,
            DispatchError::HandlerFailed { .. } => ErrorKind::HandlerFailed,
            DispatchError::Resolve(_) => ErrorKind::Unresolved,
            DispatchError::Extract(_) => ErrorKind::ExtractionFailed,
        }
    }
}

/// Errors from event source lifecycle calls.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source was started twice without a stop in between.
    #[error("event source `{0}` is already started")]
    AlreadyStarted(String),

    /// The source failed.
    #[error("event source failed")]
    Failed(#[source] BoxError),
}

/// Error type for parameter extraction failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractError {
    message: String,
}

impl ExtractError {
    /// Create a new extraction error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "extraction failed: {}", self.message)
    }
}

impl std::error::Error for ExtractError {}

// Convenience conversions
impl From<BoxError> for StratumError {
    fn from(err: BoxError) -> Self {
        StratumError::Custom(err)
    }
}
