#![allow(dead_code)]

use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use stratum::{
    BoxError, ChannelClient, DispatchError, ExtractError, LayeredApplication, NoopLogger,
    prelude::*,
};

// ============================================================================
// Simple Controllers
// ============================================================================

pub struct HelloController;

impl Injectable for HelloController {
    fn construct(_scope: &Scope) -> Result<Self, ResolveError> {
        Ok(HelloController)
    }
}

impl HelloController {
    pub fn world(&self) -> Value {
        json!({ "message": "Hello, World!" })
    }
}

pub const HELLO: Token<HelloController> = Token::new("HelloController");

pub fn hello_controller() -> ControllerDescriptor<HelloController> {
    ControllerDescriptor::injectable(HELLO).route(
        Route::get("world"),
        |ctl: Arc<HelloController>, _: Params| async move { ctl.world() },
    )
}

pub struct EchoController;

impl Injectable for EchoController {
    fn construct(_scope: &Scope) -> Result<Self, ResolveError> {
        Ok(EchoController)
    }
}

pub const ECHO: Token<EchoController> = Token::new("EchoController");

pub fn echo_controller() -> ControllerDescriptor<EchoController> {
    ControllerDescriptor::injectable(ECHO).route(
        Route::post("echo").bind(ParamBinding::Body),
        |_: Arc<EchoController>, params: Params| async move {
            let received: Value = params.get(0)?;
            Ok::<_, ExtractError>(json!({ "message": "Echo response", "received": received }))
        },
    )
}

// ============================================================================
// Composable Security
// ============================================================================

/// Placeholder security check: lets everything through, counting calls.
#[derive(Default)]
pub struct SecurityMiddleware {
    checks: AtomicUsize,
}

impl SecurityMiddleware {
    pub async fn check_security(&self, _event: &Event) -> Result<(), BoxError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

pub const SECURITY_MIDDLEWARE: Token<SecurityMiddleware> = Token::new("SecurityMiddleware");

pub struct SecurityController {
    next: Arc<DelegateHandle>,
}

impl Injectable for SecurityController {
    fn construct(scope: &Scope) -> Result<Self, ResolveError> {
        Ok(Self {
            next: scope.resolve(&NEXT_LAYER)?,
        })
    }
}

impl SecurityController {
    /// Hand the event to the next layer and answer with its final response.
    pub async fn forward(&self, event: Event) -> Result<Response, DispatchError> {
        let stack = self.next.generate_event(&event).await?;
        Ok(stack.into_last().unwrap_or(Response::value(Value::Null)))
    }
}

pub const SECURITY: Token<SecurityController> = Token::new("SecurityController");

pub fn security_controller() -> ControllerDescriptor<SecurityController> {
    ControllerDescriptor::injectable(SECURITY).route(
        Route::everything("forward")
            .bind(ParamBinding::FullEvent)
            .with(MiddlewareRef::method(
                SECURITY_MIDDLEWARE,
                "checkSecurity",
                |m, event| Box::pin(m.check_security(event)),
            )),
        |ctl: Arc<SecurityController>, params: Params| async move {
            let event = params.full_event()?;
            Ok::<_, BoxError>(ctl.forward(event).await?)
        },
    )
}

pub struct BusinessController;

impl Injectable for BusinessController {
    fn construct(_scope: &Scope) -> Result<Self, ResolveError> {
        Ok(BusinessController)
    }
}

impl BusinessController {
    pub fn users(&self) -> Value {
        json!({
            "users": [
                { "id": 1, "name": "Alice" },
                { "id": 2, "name": "Bob" },
                { "id": 3, "name": "Charlie" },
            ]
        })
    }

    /// Fields supplied by the caller win over the generated id.
    pub fn create_user(&self, body: Value) -> Result<Value, ExtractError> {
        let Value::Object(fields) = body else {
            return Err(ExtractError::new("user must be an object"));
        };
        let mut user = serde_json::Map::new();
        user.insert("id".into(), json!(uuid::Uuid::new_v4().to_string()));
        user.extend(fields);
        Ok(json!({ "message": "User created", "user": user }))
    }

    pub fn profile(&self) -> Value {
        json!({
            "id": 1,
            "name": "Alice",
            "email": "alice@example.com",
            "role": "admin",
        })
    }
}

pub const BUSINESS: Token<BusinessController> = Token::new("BusinessController");

pub fn business_controller() -> ControllerDescriptor<BusinessController> {
    ControllerDescriptor::injectable(BUSINESS)
        .route(
            Route::get("users"),
            |ctl: Arc<BusinessController>, _: Params| async move { ctl.users() },
        )
        .route(
            Route::post("createUser").bind(ParamBinding::Body),
            |ctl: Arc<BusinessController>, params: Params| async move {
                let body: Value = params.get(0)?;
                ctl.create_user(body)
            },
        )
        .route(
            Route::get("profile"),
            |ctl: Arc<BusinessController>, _: Params| async move { ctl.profile() },
        )
}

/// A security layer in front of a business layer, sharing one root scope.
pub struct SecurityStack {
    pub root: Scope,
    pub checks: Arc<SecurityMiddleware>,
    pub client: ChannelClient,
    pub layers: LayeredApplication,
}

impl SecurityStack {
    pub fn security(&self) -> &Application {
        &self.layers.layers()[0]
    }

    pub fn business(&self) -> &Application {
        &self.layers.layers()[1]
    }
}

pub fn security_stack(logger: Arc<dyn Logger>) -> SecurityStack {
    let root = Scope::root("root");

    let delegate = DelegateEventSource::with_logger(logger.clone());
    root.register_value(&NEXT_LAYER, Arc::new(delegate.handle()));

    let business = Application::builder()
        .with_name("business")
        .with_scope(root.create_child("business"))
        .with_logger(logger.clone())
        .event_source(delegate)
        .controller(business_controller())
        .build()
        .expect("business layer assembles");

    let security_scope = root.create_child("security");
    let checks = Arc::new(SecurityMiddleware::default());
    security_scope.register_value(&SECURITY_MIDDLEWARE, checks.clone());

    let source = ChannelEventSource::new(16).with_logger(logger.clone());
    let client = source.client();
    let security = Application::builder()
        .with_name("security")
        .with_scope(security_scope)
        .with_logger(logger)
        .event_source(source)
        .controller(security_controller())
        .build()
        .expect("security layer assembles");

    SecurityStack {
        root,
        checks,
        client,
        layers: LayeredApplication::new().layer(security).layer(business),
    }
}

pub fn silent() -> Arc<dyn Logger> {
    Arc::new(NoopLogger)
}

// ============================================================================
// Logger Injection
// ============================================================================

pub struct GreetingController {
    logger: Arc<dyn Logger>,
}

impl Injectable for GreetingController {
    fn construct(scope: &Scope) -> Result<Self, ResolveError> {
        Ok(Self {
            logger: scope.resolve(&LOGGER)?,
        })
    }
}

impl GreetingController {
    pub fn greet(&self, name: &str) -> Value {
        self.logger
            .info("greeting", &log_context! { "name" => name });
        json!({ "message": format!("Hello, {name}!") })
    }
}

pub const GREETING: Token<GreetingController> = Token::new("GreetingController");

pub fn greeting_controller() -> ControllerDescriptor<GreetingController> {
    ControllerDescriptor::injectable(GREETING).route(
        Route::post("greet").bind(ParamBinding::field("name")),
        |ctl: Arc<GreetingController>, params: Params| async move {
            let name: String = params.get(0)?;
            Ok::<_, ExtractError>(ctl.greet(&name))
        },
    )
}
