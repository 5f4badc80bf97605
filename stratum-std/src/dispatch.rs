//! The route-table dispatcher.

use crate::{
    middleware::{MiddlewareScope, SharedInstances},
    routing::RouteTable,
    scope::Scope,
};
use futures::FutureExt;
use std::{panic::AssertUnwindSafe, sync::Arc};
use stratum_core::{
    DispatchError, Dispatcher, ErrorKind, Event, Logger, Params, Response, ResponseStack,
    log_context,
};

/// Dispatches events through a [`RouteTable`].
///
/// For each event: select the first matching route, run its middleware,
/// project parameters, resolve the controller from the scope, run the
/// handler, and append the outcome to the event's response stack.
///
/// Failures after a route is selected (a rejecting middleware, an
/// unresolvable controller, a failing or panicking handler) are appended as
/// error responses and the stack is still returned. Only an unmatched
/// selector is returned as an error.
pub struct RouteDispatcher {
    name: String,
    table: RouteTable,
    scope: Scope,
    logger: Arc<dyn Logger>,
    shared: SharedInstances,
    default_scope: MiddlewareScope,
}

impl RouteDispatcher {
    /// A dispatcher over `table`, resolving components from `scope`.
    pub fn new(table: RouteTable, scope: Scope, logger: Arc<dyn Logger>) -> Self {
        Self {
            name: scope.name().to_string(),
            table,
            scope,
            logger,
            shared: SharedInstances::new(),
            default_scope: MiddlewareScope::default(),
        }
    }

    /// Scope used for middleware steps that don't set their own.
    pub fn with_default_middleware_scope(mut self, scope: MiddlewareScope) -> Self {
        self.default_scope = scope;
        self
    }

    /// Override the name used in logs (defaults to the scope's name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The route table.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The scope components are resolved from.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Cached [`MiddlewareScope::Shared`] instances.
    pub fn shared_instances(&self) -> &SharedInstances {
        &self.shared
    }

    async fn dispatch_inner(&self, event: &Event) -> Result<ResponseStack, DispatchError> {
        let Some(entry) = self.table.route(event.selector()).matched() else {
            self.logger.notice(
                "no route matched",
                &log_context! {
                    "app" => self.name,
                    "event" => event.id().to_string(),
                    "selector" => event.selector().to_string(),
                },
            );
            return Err(DispatchError::RouteNotFound {
                selector: event.selector().to_string(),
            });
        };

        self.logger.debug(
            "route selected",
            &log_context! {
                "app" => self.name,
                "event" => event.id().to_string(),
                "handler" => entry.handler(),
            },
        );

        if let Err(err) = entry
            .chain()
            .run(event, &self.scope, &self.shared, self.default_scope)
            .await
        {
            self.logger.warning(
                "middleware stopped the event",
                &log_context! {
                    "app" => self.name,
                    "event" => event.id().to_string(),
                    "handler" => entry.handler(),
                    "reason" => err.to_string(),
                },
            );
            event.push_response(Response::from(&err));
            return Ok(event.responses());
        }

        let params = Params::project(event, entry.bindings());
        let outcome = AssertUnwindSafe(entry.endpoint().invoke(&self.scope, params))
            .catch_unwind()
            .await;
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => Response::from(&DispatchError::Resolve(err)),
            Err(_) => Response::from(&DispatchError::HandlerFailed {
                handler: entry.handler().to_string(),
                message: "handler panicked".to_string(),
            }),
        };

        if let Response::Error(error) = &response {
            let level_context = log_context! {
                "app" => self.name,
                "event" => event.id().to_string(),
                "handler" => entry.handler(),
                "kind" => error.kind,
                "message" => error.message,
            };
            match error.kind {
                ErrorKind::NoDispatcherBound | ErrorKind::Unresolved => {
                    self.logger.critical("event could not be handled", &level_context)
                }
                _ => self.logger.error("handler failed", &level_context),
            }
        }

        event.push_response(response);
        Ok(event.responses())
    }
}

impl Dispatcher for RouteDispatcher {
    async fn dispatch(&self, event: &Event) -> Result<ResponseStack, DispatchError> {
        #[cfg(feature = "tracing")]
        {
            use tracing::Instrument;
            let span = tracing::debug_span!(
                "dispatch",
                app = %self.name,
                event = %event.id(),
                selector = %event.selector(),
            );
            self.dispatch_inner(event).instrument(span).await
        }
        #[cfg(not(feature = "tracing"))]
        {
            self.dispatch_inner(event).await
        }
    }
}

impl std::fmt::Debug for RouteDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDispatcher")
            .field("name", &self.name)
            .field("routes", &self.table.len())
            .field("default_scope", &self.default_scope)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        controller::{ControllerDescriptor, ControllerSource},
        middleware::MiddlewareRef,
        routing::Route,
        scope::{Injectable, Token},
        testing::{FailingMiddleware, MemoryLogger, RecordingMiddleware},
    };
    use serde_json::{Value, json};
    use stratum_core::{LogLevel, ParamBinding, ResolveError};

    struct Echo;

    impl Injectable for Echo {
        fn construct(_scope: &Scope) -> Result<Self, ResolveError> {
            Ok(Echo)
        }
    }

    const ECHO: Token<Echo> = Token::new("Echo");
    const RECORD: Token<RecordingMiddleware> = Token::new("Record");
    const DENY: Token<FailingMiddleware> = Token::new("Deny");

    fn echo_controller() -> ControllerDescriptor<Echo> {
        ControllerDescriptor::injectable(ECHO)
            .route(
                Route::post("echo").bind(ParamBinding::Body),
                |_: Arc<Echo>, params: Params| async move {
                    let body: Value = params.get(0)?;
                    Ok::<_, stratum_core::ExtractError>(
                        json!({"message": "Echo response", "received": body}),
                    )
                },
            )
            .route(
                Route::post("age").bind(ParamBinding::field("age")),
                |_: Arc<Echo>, params: Params| async move {
                    let age: u32 = params.get(0)?;
                    Ok::<_, stratum_core::ExtractError>(json!(age))
                },
            )
            .route(Route::get("boom"), |_: Arc<Echo>, _: Params| async {
                Err::<Value, _>(std::io::Error::other("intentional failure"))
            })
            .route(Route::get("panic"), |_: Arc<Echo>, _: Params| async {
                if true {
                    panic!("handler exploded");
                }
                Value::Null
            })
            .route(
                Route::get("guarded")
                    .with(MiddlewareRef::of(RECORD))
                    .with(MiddlewareRef::of(DENY)),
                |_: Arc<Echo>, _: Params| async { "unreachable" },
            )
    }

    fn dispatcher(scope: Scope, logger: Arc<MemoryLogger>) -> RouteDispatcher {
        let descriptor = echo_controller();
        let table =
            RouteTable::from_controllers([&descriptor as &dyn ControllerSource], &scope).unwrap();
        RouteDispatcher::new(table, scope, logger)
    }

    fn scope_with_middleware(record: Arc<RecordingMiddleware>) -> Scope {
        let scope = Scope::root("app");
        scope.register_value(&RECORD, record);
        scope.register_value(&DENY, Arc::new(FailingMiddleware::new("denied")));
        scope
    }

    #[tokio::test]
    async fn test_successful_dispatch_appends_response() {
        let record = Arc::new(RecordingMiddleware::new("record"));
        let dispatcher = dispatcher(scope_with_middleware(record), Arc::new(MemoryLogger::new()));

        let event = Event::post("/echo", json!({"name": "Alice"}));
        let stack = dispatcher.dispatch(&event).await.unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(
            stack.last_value(),
            Some(&json!({"message": "Echo response", "received": {"name": "Alice"}}))
        );
        assert_eq!(event.response_count(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_selector_is_error() {
        let logger = Arc::new(MemoryLogger::new());
        let record = Arc::new(RecordingMiddleware::new("record"));
        let dispatcher = dispatcher(scope_with_middleware(record), logger.clone());

        let event = Event::get("/nowhere");
        let err = dispatcher.dispatch(&event).await.unwrap_err();
        assert!(matches!(err, DispatchError::RouteNotFound { .. }));
        assert_eq!(event.response_count(), 0);
        assert_eq!(logger.count_at(LogLevel::Notice), 1);
    }

    #[tokio::test]
    async fn test_rejection_skips_handler() {
        let record = Arc::new(RecordingMiddleware::new("record"));
        let dispatcher = dispatcher(
            scope_with_middleware(record.clone()),
            Arc::new(MemoryLogger::new()),
        );

        let event = Event::get("/guarded");
        let stack = dispatcher.dispatch(&event).await.unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(
            stack.last().unwrap().error_kind(),
            Some(ErrorKind::MiddlewareRejected)
        );
        assert_eq!(record.count(), 1);
    }

    #[tokio::test]
    async fn test_handler_failure_is_captured() {
        let logger = Arc::new(MemoryLogger::new());
        let record = Arc::new(RecordingMiddleware::new("record"));
        let dispatcher = dispatcher(scope_with_middleware(record), logger.clone());

        let stack = dispatcher.dispatch(&Event::get("/boom")).await.unwrap();
        assert_eq!(
            stack.last().unwrap().to_json(),
            json!({"error": "handler_failed", "message": "intentional failure"})
        );
        assert_eq!(logger.count_at(LogLevel::Error), 1);

        let stack = dispatcher.dispatch(&Event::get("/panic")).await.unwrap();
        assert_eq!(stack.last().unwrap().error_kind(), Some(ErrorKind::HandlerFailed));
    }

    #[tokio::test]
    async fn test_missing_body_projects_null() {
        let record = Arc::new(RecordingMiddleware::new("record"));
        let dispatcher = dispatcher(scope_with_middleware(record), Arc::new(MemoryLogger::new()));
        let event = Event::new(
            stratum_core::Selector::post("/echo"),
            stratum_core::Payload::new(),
        );
        let stack = dispatcher.dispatch(&event).await.unwrap();
        assert_eq!(
            stack.last_value(),
            Some(&json!({"message": "Echo response", "received": null}))
        );
    }

    #[tokio::test]
    async fn test_bad_field_is_extraction_failure() {
        let record = Arc::new(RecordingMiddleware::new("record"));
        let dispatcher = dispatcher(scope_with_middleware(record), Arc::new(MemoryLogger::new()));
        let event = Event::post("/age", json!({"age": "forty"}));
        let stack = dispatcher.dispatch(&event).await.unwrap();
        assert_eq!(
            stack.last().unwrap().error_kind(),
            Some(ErrorKind::ExtractionFailed)
        );
    }
}
