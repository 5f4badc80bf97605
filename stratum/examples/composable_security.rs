//! A security layer in front of a business layer.
//!
//! The outer application receives events from a channel, runs its security
//! middleware, and forwards the very same event to the inner application
//! through a delegate event source. Both layers resolve from children of
//! one root scope.
//!
//! ```text
//! RUST_LOG=stratum=debug cargo run -p stratum --example composable_security
//! ```

use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use stratum::{BoxError, DispatchError, prelude::*};
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct AuditMiddleware {
    seen: AtomicUsize,
}

impl AuditMiddleware {
    async fn audit(&self, event: &Event) -> Result<(), BoxError> {
        let n = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(event = %event.id(), selector = %event.selector(), n, "audited");
        if event.payload().header("x-blocked").is_some() {
            return Err("caller is blocked".into());
        }
        Ok(())
    }
}

const AUDIT: Token<AuditMiddleware> = Token::new("AuditMiddleware");

struct Gateway {
    next: Arc<DelegateHandle>,
}

impl Injectable for Gateway {
    fn construct(scope: &Scope) -> Result<Self, ResolveError> {
        Ok(Self {
            next: scope.resolve(&NEXT_LAYER)?,
        })
    }
}

impl Gateway {
    async fn forward(&self, event: Event) -> Result<Response, DispatchError> {
        let stack = self.next.generate_event(&event).await?;
        Ok(stack.into_last().unwrap_or(Response::value(Value::Null)))
    }
}

struct Users;

impl Injectable for Users {
    fn construct(_scope: &Scope) -> Result<Self, ResolveError> {
        Ok(Users)
    }
}

fn gateway() -> ControllerDescriptor<Gateway> {
    ControllerDescriptor::injectable(Token::new("Gateway")).route(
        Route::everything("forward")
            .bind(ParamBinding::FullEvent)
            .with(MiddlewareRef::method(AUDIT, "audit", |m, event| {
                Box::pin(m.audit(event))
            })),
        |ctl: Arc<Gateway>, params: Params| async move {
            let event = params.full_event()?;
            Ok::<_, BoxError>(ctl.forward(event).await?)
        },
    )
}

fn users() -> ControllerDescriptor<Users> {
    ControllerDescriptor::injectable(Token::new("Users")).route(
        Route::get("users"),
        |_: Arc<Users>, _: Params| async move {
            json!({
                "users": [
                    { "id": 1, "name": "Alice" },
                    { "id": 2, "name": "Bob" },
                    { "id": 3, "name": "Charlie" },
                ]
            })
        },
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stratum=info")),
        )
        .init();

    let root = Scope::root("root");
    let delegate = DelegateEventSource::new();
    root.register_value(&NEXT_LAYER, Arc::new(delegate.handle()));

    let business = Application::builder()
        .with_name("business")
        .with_scope(root.create_child("business"))
        .event_source(delegate)
        .controller(users())
        .build()?;

    let security_scope = root.create_child("security");
    security_scope.register_value(&AUDIT, Arc::new(AuditMiddleware::default()));
    let source = ChannelEventSource::new(32).with_name("edge");
    let client = source.client();
    let security = Application::builder()
        .with_name("security")
        .with_scope(security_scope)
        .event_source(source)
        .controller(gateway())
        .build()?;

    let stack = LayeredApplication::new().layer(security).layer(business);
    stack.run().await?;

    let allowed = client.send(Event::get("/users")).await?;
    println!("GET /users -> {}", serde_json::to_string(&allowed)?);

    let blocked = Event::new(
        stratum::Selector::get("/users"),
        stratum::Payload::new().with_header("X-Blocked", "1"),
    );
    let blocked = client.send(blocked).await?;
    println!("blocked GET /users -> {}", serde_json::to_string(&blocked)?);

    let missing = client.send(Event::get("/nowhere")).await?;
    println!("GET /nowhere -> {}", serde_json::to_string(&missing)?);

    for status in stack.stop().await? {
        println!("{}: {:?}", status.name, status.state);
    }
    Ok(())
}
