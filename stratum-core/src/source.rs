//! Event source contract.
//!
//! An event source observes external occurrences, turns each into an
//! [`Event`](crate::Event), hands it to the dispatcher it was started with,
//! and translates the returned response stack (or routing failure) into
//! whatever its transport needs. Per-event failures must never stop the
//! source.

use crate::{dispatcher::DynDispatcher, error::SourceError};
use async_trait::async_trait;
use std::sync::Arc;

/// Producer of events for one application.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Begin delivering events to `dispatcher`.
    async fn start(&self, dispatcher: Arc<dyn DynDispatcher>) -> Result<(), SourceError>;

    /// Stop delivering events and release the dispatcher.
    async fn stop(&self) -> Result<(), SourceError>;
}
