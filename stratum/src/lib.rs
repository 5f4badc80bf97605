//! # stratum - In-Process Layered Request Dispatch
//!
//! `stratum` builds applications out of independent layers that live in one
//! process. Each layer has its own routes, middleware and dependency scope;
//! an outer layer hands events to an inner one through a delegate event
//! source instead of a network hop, and the inner layer handles the *same*
//! event.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stratum::prelude::*;
//!
//! struct HelloController;
//!
//! impl Injectable for HelloController {
//!     fn construct(_scope: &Scope) -> Result<Self, ResolveError> {
//!         Ok(HelloController)
//!     }
//! }
//!
//! const HELLO: Token<HelloController> = Token::new("HelloController");
//!
//! let source = ChannelEventSource::new(64);
//! let client = source.client();
//! let app = Application::builder()
//!     .with_name("hello")
//!     .event_source(source)
//!     .controller(ControllerDescriptor::injectable(HELLO).route(
//!         Route::get("world"),
//!         |_: Arc<HelloController>, _: Params| async { json!({"message": "Hello, World!"}) },
//!     ))
//!     .build()?;
//!
//! app.run().await?;
//! let reply = client.send(Event::get("/world")).await?;
//! ```
//!
//! ## Layering
//!
//! 1. Create a shared root [`Scope`] and a [`DelegateEventSource`] for the
//!    inner layer; register the delegate's handle under [`NEXT_LAYER`].
//! 2. Build the inner application on a child scope with the delegate as
//!    its event source.
//! 3. Build the outer application on another child scope. Its catch-all
//!    route resolves [`NEXT_LAYER`] and forwards the event.
//! 4. Run the layers through [`LayeredApplication`], which starts the inner
//!    layer first.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod app;
pub mod composition;
pub mod config;

pub use app::{AppStatus, Application, ApplicationBuilder, LifecycleState};
pub use composition::LayeredApplication;
pub use config::{ApplicationConfig, ConfigError};

pub use stratum_core::{
    AssemblyError, BoxError, DispatchError, Dispatcher, DynDispatcher, DynHandler, ErrorKind,
    ErrorResponse, Event, EventId, EventSource, ExtractError, Handler, IntoResponse, Json,
    LogContext, LogLevel, Logger, Method, Middleware, NoopLogger, Param, ParamBinding, Params,
    Payload, ResolveError, Response, ResponseStack, RoutePattern, Selector, SourceError,
    StratumError, log_context,
};

pub use stratum_std::{
    controller::{ControllerDescriptor, ControllerSource},
    dispatch::RouteDispatcher,
    logging::{default_logger, silent_logger},
    middleware::{MiddlewareChain, MiddlewareRef, MiddlewareScope},
    routing::{Route, RouteTable},
    scope::{Binding, Injectable, Lifetime, Scope, Token},
    sources::{
        ChannelClient, ChannelEventSource, DelegateEventSource, DelegateHandle, Reply, ReplyStatus,
    },
    testing,
};

#[cfg(feature = "tracing")]
pub use stratum_std::logging::TracingLogger;

/// Token under which every application registers its logger.
pub const LOGGER: Token<dyn Logger> = Token::new("Logger");

/// Conventional token for the handle an outer layer forwards through.
pub const NEXT_LAYER: Token<DelegateHandle> = Token::new("NextLayer");

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        Application, ApplicationConfig, Binding, ChannelEventSource, ControllerDescriptor,
        DelegateEventSource, DelegateHandle, Event, Injectable, IntoResponse, LOGGER,
        LayeredApplication, Lifetime, Logger, Middleware, MiddlewareRef, NEXT_LAYER, ParamBinding,
        Params, ResolveError, Response, Route, Scope, Token, log_context,
    };
    pub use serde_json::json;
    pub use std::sync::Arc;
}
