//! # Handler
//!
//! The terminal endpoint of a route. A handler receives the resolved
//! controller instance and the projected [`Params`], runs business logic,
//! and produces something that converts into a [`Response`].
//!
//! Closures of the shape `Fn(Arc<C>, Params) -> impl Future<Output = impl IntoResponse>`
//! implement [`Handler`] automatically, which is how route tables are
//! usually declared:
//!
//! ```rust,ignore
//! ControllerDescriptor::<HelloController>::new(HELLO)
//!     .route(Route::get("world"), |ctl, _params| async move { ctl.world() })
//! ```

use crate::{
    params::Params,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::{future::Future, sync::Arc};

/// A route endpoint operating on controller `C`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle requests for controller `{C}`",
    label = "missing `Handler<{C}>` implementation",
    note = "Handlers are closures `Fn(Arc<{C}>, Params) -> impl Future<Output = impl IntoResponse>`."
)]
pub trait Handler<C>: Send + Sync + 'static {
    /// Executes the handler logic.
    fn handle(&self, controller: Arc<C>, params: Params) -> impl Future<Output = Response> + Send;
}

// Blanket impl for closures
impl<F, C, Fut, Out> Handler<C> for F
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Out> + Send,
    Out: IntoResponse,
{
    async fn handle(&self, controller: Arc<C>, params: Params) -> Response {
        (self)(controller, params).await.into_response()
    }
}

/// Object-safe version of [`Handler`], used by route tables.
pub trait DynHandler<C>: Send + Sync + 'static {
    /// Executes the handler logic (dynamic dispatch version).
    fn handle_dyn(&self, controller: Arc<C>, params: Params) -> BoxFuture<'_, Response>;
}

impl<C, H> DynHandler<C> for H
where
    C: Send + Sync + 'static,
    H: Handler<C>,
{
    fn handle_dyn(&self, controller: Arc<C>, params: Params) -> BoxFuture<'_, Response> {
        Box::pin(self.handle(controller, params))
    }
}
