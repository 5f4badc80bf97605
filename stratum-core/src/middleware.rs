//! # Middleware
//!
//! Pre-handler interceptors. A middleware step observes the event before the
//! route's handler runs and either completes (the chain proceeds) or fails
//! (the chain aborts, an error response is recorded, and the handler is
//! never invoked). There is no other outcome: middleware cannot hand a value
//! to the handler and cannot skip ahead. It communicates only through
//! success/failure and side effects on injected shared state.
//!
//! Implementing [`Middleware`] gives a type its default step. Types with
//! several named steps register each one explicitly instead (see
//! `MiddlewareRef::method` in `stratum-std`).

use crate::{error::BoxError, event::Event};
use std::future::Future;

/// A pre-handler interceptor with a single default step.
///
/// # Example
///
/// ```rust
/// use stratum_core::{BoxError, Event, Middleware};
///
/// struct RequireTraceHeader;
///
/// impl Middleware for RequireTraceHeader {
///     async fn before(&self, event: &Event) -> Result<(), BoxError> {
///         match event.payload().header("x-trace") {
///             Some(_) => Ok(()),
///             None => Err("missing x-trace header".into()),
///         }
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Middleware`",
    label = "missing `Middleware` implementation",
    note = "Implement `before`, or register a named step with `MiddlewareRef::method`."
)]
pub trait Middleware: Send + Sync + 'static {
    /// Runs before the handler. Any error aborts the chain.
    fn before(&self, event: &Event) -> impl Future<Output = Result<(), BoxError>> + Send;
}
