//! # stratum-core
//!
//! Core contracts for the Stratum layered dispatch framework.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! controllers, middleware and event sources that don't need the full
//! `stratum-std` implementation.
//!
//! # Request Path
//!
//! An [`Event`] enters through an [`EventSource`], which hands it to a
//! [`Dispatcher`]. The dispatcher selects one route by [`Selector`], runs
//! that route's [`Middleware`] steps in order, projects [`Params`] for the
//! [`Handler`], and appends the handler's [`Response`] to the event's
//! [`ResponseStack`].
//!
//! ## Layering
//!
//! A handler may itself forward the *same* event to another application's
//! dispatcher through a delegate event source. That is how independent
//! layers (security in front of business logic, say) compose inside one
//! process without a network hop: each layer keeps its own routes,
//! middleware and dependency scope.
//!
//! # Error Types
//!
//! - [`StratumError`] - Top-level error type
//! - [`AssemblyError`] - Fatal construction errors
//! - [`DispatchError`] - Per-event errors
//! - [`ResolveError`] - Dependency lookups

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod dispatcher;
mod error;
mod event;
mod handler;
mod logger;
mod middleware;
mod params;
mod response;
mod selector;
mod source;

// Re-exports
pub use dispatcher::{Dispatcher, DynDispatcher};
pub use error::{
    AssemblyError, BoxError, DispatchError, ExtractError, ResolveError, SourceError, StratumError,
};
pub use event::{Event, EventId, Payload};
pub use handler::{DynHandler, Handler};
pub use logger::{LogContext, LogLevel, Logger, NoopLogger};
pub use middleware::Middleware;
pub use params::{Param, ParamBinding, Params};
pub use response::{
    ErrorKind, ErrorResponse, IntoResponse, Json, Response, ResponseStack, failure_response,
};
pub use selector::{Method, MethodMatch, PathMatch, RoutePattern, Selector, normalize_path};
pub use source::EventSource;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
