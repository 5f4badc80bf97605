use serde_json::json;
use std::sync::Arc;
use stratum::{
    AssemblyError, ChannelEventSource, DelegateEventSource, DispatchError, ErrorKind, Event,
    Params, ReplyStatus, Route,
};

mod common;
use common::{HelloController, echo_controller, hello_controller, silent};

#[tokio::test]
async fn test_hello_world_over_channel() {
    let source = ChannelEventSource::new(8);
    let client = source.client();
    let app = stratum::Application::builder()
        .with_name("hello")
        .with_logger(silent())
        .event_source(source)
        .controller(hello_controller())
        .controller(echo_controller())
        .build()
        .unwrap();

    app.run().await.unwrap();
    let reply = client.send(Event::get("/world")).await.unwrap();
    assert_eq!(reply.status, ReplyStatus::Ok);
    assert_eq!(reply.body, json!({"message": "Hello, World!"}));
    app.stop().await.unwrap();
}

#[tokio::test]
async fn test_echo_returns_body() {
    let app = stratum::Application::builder()
        .with_logger(silent())
        .event_source(DelegateEventSource::new())
        .controller(echo_controller())
        .build()
        .unwrap();

    let event = Event::post("/echo", json!({"name": "Alice", "age": 30}));
    let stack = app.dispatch(&event).await.unwrap();
    assert_eq!(
        stack.last_value(),
        Some(&json!({
            "message": "Echo response",
            "received": {"name": "Alice", "age": 30}
        }))
    );
    assert_eq!(event.response_count(), 1);
}

#[tokio::test]
async fn test_unknown_route() {
    let source = ChannelEventSource::new(8);
    let client = source.client();
    let app = stratum::Application::builder()
        .with_logger(silent())
        .event_source(source)
        .controller(hello_controller())
        .build()
        .unwrap();
    app.run().await.unwrap();

    let reply = client.send(Event::post("/world", json!({}))).await.unwrap();
    assert_eq!(reply.status, ReplyStatus::NotFound);
    assert_eq!(reply.body["error"], json!(ErrorKind::RouteNotFound));

    let err = app.dispatch(&Event::get("/missing")).await.unwrap_err();
    assert!(matches!(err, DispatchError::RouteNotFound { .. }));
    app.stop().await.unwrap();
}

#[test]
fn test_duplicate_routes_fail_assembly() {
    let twice = hello_controller().route(
        Route::get("greeting").at("/world"),
        |_: Arc<HelloController>, _: Params| async { json!({"message": "shadow"}) },
    );
    let err = stratum::Application::builder()
        .with_logger(silent())
        .event_source(DelegateEventSource::new())
        .controller(twice)
        .build()
        .unwrap_err();
    assert!(matches!(err, AssemblyError::DuplicateRoute { .. }));
}

#[test]
fn test_duplicates_across_controllers_fail_assembly() {
    let err = stratum::Application::builder()
        .with_logger(silent())
        .event_source(DelegateEventSource::new())
        .controller(hello_controller())
        .controller(hello_controller())
        .build()
        .unwrap_err();
    match err {
        AssemblyError::DuplicateRoute { pattern, .. } => assert_eq!(pattern, "GET /world"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_event_source() {
    let err = stratum::Application::builder()
        .with_name("nowhere")
        .controller(hello_controller())
        .build()
        .unwrap_err();
    assert!(matches!(err, AssemblyError::MissingEventSource(name) if name == "nowhere"));
}
