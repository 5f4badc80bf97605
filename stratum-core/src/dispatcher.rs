//! Dispatcher core traits.

use crate::{error::DispatchError, event::Event, response::ResponseStack};
use futures::future::BoxFuture;
use std::future::Future;

/// Routes an event to exactly one handler and records the result.
///
/// Implementations append every handler result (or captured failure) to the
/// event's response stack and return a snapshot of it. Only failures that
/// prevent any route from running are returned as errors.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot dispatch events",
    label = "missing `Dispatcher` implementation",
    note = "Implement `Dispatcher` to handle event dispatching."
)]
pub trait Dispatcher: Send + Sync {
    /// Dispatch the event.
    fn dispatch(
        &self,
        event: &Event,
    ) -> impl Future<Output = Result<ResponseStack, DispatchError>> + Send;
}

/// Object-safe version of [`Dispatcher`] for dynamic dispatch.
pub trait DynDispatcher: Send + Sync {
    /// Dispatch the event (dynamic dispatch version).
    fn dispatch_dyn<'a>(
        &'a self,
        event: &'a Event,
    ) -> BoxFuture<'a, Result<ResponseStack, DispatchError>>;
}

impl<T> DynDispatcher for T
where
    T: Dispatcher,
{
    fn dispatch_dyn<'a>(
        &'a self,
        event: &'a Event,
    ) -> BoxFuture<'a, Result<ResponseStack, DispatchError>> {
        Box::pin(self.dispatch(event))
    }
}
