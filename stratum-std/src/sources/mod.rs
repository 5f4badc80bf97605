//! # Event Sources
//!
//! - [`DelegateEventSource`]: in-process bridge between layers. The outer
//!   layer forwards an event through a [`DelegateHandle`]; the inner
//!   layer's dispatcher handles the very same event.
//! - [`ChannelEventSource`]: an async request/reply loop over a tokio
//!   channel, standing in for a network transport.

mod channel;
mod delegate;

pub use channel::{ChannelClient, ChannelEventSource, Reply, ReplyStatus};
pub use delegate::{DelegateEventSource, DelegateHandle};
