//! Delegate event source.

use crate::logging::default_logger;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use stratum_core::{
    DispatchError, DynDispatcher, Event, EventSource, Logger, ResponseStack, SourceError,
    log_context,
};

struct DelegateInner {
    name: String,
    dispatcher: RwLock<Option<Arc<dyn DynDispatcher>>>,
    logger: Arc<dyn Logger>,
}

impl DelegateInner {
    async fn forward(&self, event: &Event) -> Result<ResponseStack, DispatchError> {
        let dispatcher = self.dispatcher.read().clone();
        match dispatcher {
            Some(dispatcher) => dispatcher.dispatch_dyn(event).await,
            None => {
                self.logger.critical(
                    "event forwarded before a dispatcher was bound",
                    &log_context! {
                        "source" => self.name,
                        "event" => event.id().to_string(),
                        "selector" => event.selector().to_string(),
                    },
                );
                Err(DispatchError::NoDispatcherBound)
            }
        }
    }
}

/// Event source whose events are generated programmatically, usually by
/// an outer layer's handler.
///
/// The inner application owns the delegate and binds its dispatcher when
/// it starts. The outer layer only keeps a [`DelegateHandle`], typically
/// resolved from a shared scope:
///
/// ```rust,ignore
/// let delegate = DelegateEventSource::new();
/// root.register_value(&NEXT_LAYER, Arc::new(delegate.handle()));
///
/// let business = Application::builder()
///     .with_scope(root.create_child("business"))
///     .event_source(delegate)
///     .controller(business_controller())
///     .build()?;
/// ```
pub struct DelegateEventSource {
    inner: Arc<DelegateInner>,
}

impl DelegateEventSource {
    /// An unbound delegate logging through the default logger.
    pub fn new() -> Self {
        Self::with_logger(default_logger())
    }

    /// An unbound delegate logging through `logger`.
    pub fn with_logger(logger: Arc<dyn Logger>) -> Self {
        Self {
            inner: Arc::new(DelegateInner {
                name: "delegate".to_string(),
                dispatcher: RwLock::new(None),
                logger,
            }),
        }
    }

    /// A forwarding handle that does not keep the delegate alive.
    pub fn handle(&self) -> DelegateHandle {
        DelegateHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Bind `dispatcher`. Rebinding replaces the previous one with a warning.
    pub fn register_dispatcher(&self, dispatcher: Arc<dyn DynDispatcher>) {
        let previous = self.inner.dispatcher.write().replace(dispatcher);
        if previous.is_some() {
            self.inner.logger.warning(
                "delegate dispatcher replaced",
                &log_context! { "source" => self.inner.name },
            );
        }
    }

    /// Drop the bound dispatcher, if any.
    pub fn unbind(&self) {
        self.inner.dispatcher.write().take();
    }

    /// Returns `true` if a dispatcher is bound.
    pub fn is_bound(&self) -> bool {
        self.inner.dispatcher.read().is_some()
    }

    /// Hand `event` to the bound dispatcher.
    ///
    /// The same event (not a copy) is dispatched, so the caller observes
    /// every response the inner layer appends.
    pub async fn generate_event(&self, event: &Event) -> Result<ResponseStack, DispatchError> {
        self.inner.forward(event).await
    }
}

impl Default for DelegateEventSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSource for DelegateEventSource {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn start(&self, dispatcher: Arc<dyn DynDispatcher>) -> Result<(), SourceError> {
        self.register_dispatcher(dispatcher);
        Ok(())
    }

    async fn stop(&self) -> Result<(), SourceError> {
        self.unbind();
        Ok(())
    }
}

/// A cheap, cloneable way to forward events into a delegate.
///
/// Once the owning [`DelegateEventSource`] is dropped, forwarding fails
/// with [`DispatchError::NoDispatcherBound`].
#[derive(Clone)]
pub struct DelegateHandle {
    inner: Weak<DelegateInner>,
}

impl DelegateHandle {
    /// Forward `event` to the inner layer.
    pub async fn generate_event(&self, event: &Event) -> Result<ResponseStack, DispatchError> {
        match self.inner.upgrade() {
            Some(inner) => inner.forward(event).await,
            None => Err(DispatchError::NoDispatcherBound),
        }
    }

    /// Returns `true` if the delegate is alive and bound.
    pub fn is_bound(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.dispatcher.read().is_some())
    }
}

impl std::fmt::Debug for DelegateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateHandle")
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryLogger;
    use serde_json::json;
    use stratum_core::{Dispatcher, LogLevel, Response};

    struct Answer(&'static str);

    impl Dispatcher for Answer {
        async fn dispatch(&self, event: &Event) -> Result<ResponseStack, DispatchError> {
            event.push_response(Response::value(json!(self.0)));
            Ok(event.responses())
        }
    }

    #[tokio::test]
    async fn test_unbound_delegate_fails_and_logs() {
        let logger = Arc::new(MemoryLogger::new());
        let delegate = DelegateEventSource::with_logger(logger.clone());
        let err = delegate.generate_event(&Event::get("/x")).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoDispatcherBound));
        assert_eq!(logger.count_at(LogLevel::Critical), 1);
    }

    #[tokio::test]
    async fn test_forwarding_preserves_identity() {
        let delegate = DelegateEventSource::new();
        delegate.start(Arc::new(Answer("inner"))).await.unwrap();

        let event = Event::get("/x");
        event.push_response(Response::value(json!("outer")));
        let stack = delegate.handle().generate_event(&event).await.unwrap();

        assert_eq!(stack.len(), 2);
        assert_eq!(event.responses(), stack);
        assert_eq!(stack.last_value(), Some(&json!("inner")));
    }

    #[tokio::test]
    async fn test_rebind_replaces_and_warns() {
        let logger = Arc::new(MemoryLogger::new());
        let delegate = DelegateEventSource::with_logger(logger.clone());
        delegate.register_dispatcher(Arc::new(Answer("first")));
        delegate.register_dispatcher(Arc::new(Answer("second")));
        assert_eq!(logger.count_at(LogLevel::Warning), 1);

        let stack = delegate.generate_event(&Event::get("/x")).await.unwrap();
        assert_eq!(stack.last_value(), Some(&json!("second")));
    }

    #[tokio::test]
    async fn test_stop_unbinds_and_drop_orphans_handle() {
        let delegate = DelegateEventSource::new();
        let handle = delegate.handle();
        delegate.start(Arc::new(Answer("x"))).await.unwrap();
        assert!(handle.is_bound());

        delegate.stop().await.unwrap();
        assert!(!handle.is_bound());

        drop(delegate);
        assert!(matches!(
            handle.generate_event(&Event::get("/x")).await,
            Err(DispatchError::NoDispatcherBound)
        ));
    }
}
