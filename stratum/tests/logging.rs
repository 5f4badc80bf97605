use serde_json::json;
use std::sync::Arc;
use stratum::{
    Application, DelegateEventSource, Event, LOGGER, LogLevel, Logger, Scope, testing::MemoryLogger,
};

mod common;
use common::{greeting_controller, hello_controller};

#[tokio::test]
async fn test_controller_logs_through_injected_logger() {
    let logger = Arc::new(MemoryLogger::new());
    let app = Application::builder()
        .with_name("greeter")
        .with_logger(logger.clone())
        .event_source(DelegateEventSource::new())
        .controller(greeting_controller())
        .build()
        .unwrap();

    let event = Event::post("/greet", json!({"name": "Ada"}));
    let stack = app.dispatch(&event).await.unwrap();
    assert_eq!(stack.last_value(), Some(&json!({"message": "Hello, Ada!"})));

    let greeting = logger
        .entries()
        .into_iter()
        .find(|e| e.message == "greeting")
        .expect("controller log entry");
    assert_eq!(greeting.level, LogLevel::Info);
    assert_eq!(greeting.context.get("name"), Some(&json!("Ada")));
}

#[tokio::test]
async fn test_logger_is_bound_in_app_scope() {
    let logger = Arc::new(MemoryLogger::new());
    let app = Application::builder()
        .with_logger(logger.clone())
        .event_source(DelegateEventSource::new())
        .controller(hello_controller())
        .build()
        .unwrap();

    assert!(app.scope().contains_local(&LOGGER));
    let resolved = app.scope().resolve(&LOGGER).unwrap();
    resolved.notice("via scope", &Default::default());
    assert_eq!(logger.count_at(LogLevel::Notice), 1);
    assert!(logger.contains("application assembled"));
}

#[tokio::test]
async fn test_child_scope_reuses_parent_logger() {
    let logger = Arc::new(MemoryLogger::new());
    let root = Scope::root("root");
    let shared: Arc<dyn Logger> = logger.clone();
    root.register_value(&LOGGER, shared);

    let app = Application::builder()
        .with_scope(root.create_child("inner"))
        .event_source(DelegateEventSource::new())
        .controller(greeting_controller())
        .build()
        .unwrap();

    assert!(!app.scope().contains_local(&LOGGER));
    app.dispatch(&Event::post("/greet", json!({"name": "Grace"})))
        .await
        .unwrap();
    assert!(logger.contains("greeting"));
}

#[tokio::test]
async fn test_unmatched_route_logged_as_notice() {
    let logger = Arc::new(MemoryLogger::new());
    let app = Application::builder()
        .with_logger(logger.clone())
        .event_source(DelegateEventSource::new())
        .controller(hello_controller())
        .build()
        .unwrap();

    logger.clear();
    assert!(app.dispatch(&Event::get("/missing")).await.is_err());
    assert_eq!(logger.count_at(LogLevel::Notice), 1);
    assert!(logger.contains("no route matched"));
}

#[tokio::test]
async fn test_lifecycle_is_logged() {
    let logger = Arc::new(MemoryLogger::new());
    let app = Application::builder()
        .with_logger(logger.clone())
        .event_source(DelegateEventSource::new())
        .controller(hello_controller())
        .build()
        .unwrap();

    app.run().await.unwrap();
    assert!(logger.contains("application starting"));
    assert!(logger.contains("application running"));
    app.stop().await.unwrap();
    assert!(logger.contains("application stopped"));
}
