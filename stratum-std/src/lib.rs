//! # stratum-std
//!
//! Standard implementations for the Stratum layered dispatch framework.
//!
//! This crate provides:
//! - **Dependency scopes**: [`Scope`](scope::Scope), [`Token`](scope::Token), [`Binding`](scope::Binding)
//! - **Routing**: [`Route`](routing::Route), [`RouteTable`](routing::RouteTable)
//! - **Controllers**: [`ControllerDescriptor`](controller::ControllerDescriptor)
//! - **Middleware chains**: [`MiddlewareRef`](middleware::MiddlewareRef)
//! - **Dispatching**: [`RouteDispatcher`](dispatch::RouteDispatcher)
//! - **Event sources**: [`DelegateEventSource`](sources::DelegateEventSource),
//!   [`ChannelEventSource`](sources::ChannelEventSource)

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use stratum_core;

// Modules
pub mod controller;
pub mod dispatch;
pub mod logging;
pub mod middleware;
pub mod routing;
pub mod scope;
pub mod sources;
pub mod testing;
