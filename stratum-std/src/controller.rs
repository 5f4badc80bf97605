//! # Controllers
//!
//! A controller is any `Send + Sync` type whose async methods serve
//! routes. [`ControllerDescriptor`] pairs a controller's [`Token`] with its
//! routes and handlers; the application installs descriptors into its
//! scope and route table at assembly time.
//!
//! ```rust,ignore
//! const HELLO: Token<HelloController> = Token::new("HelloController");
//!
//! let hello = ControllerDescriptor::injectable(HELLO)
//!     .route(Route::get("world"), |ctl: Arc<HelloController>, _| async move {
//!         ctl.world()
//!     });
//! ```
//!
//! Controller instances are resolved from the scope when a route runs, so a
//! transient binding yields a fresh controller per event. Marking a
//! descriptor [`singleton`](ControllerDescriptor::singleton) memoizes the
//! instance and resolves it eagerly during assembly, whichever binding ends
//! up in the application's scope.

use crate::{
    middleware::{MiddlewareChain, MiddlewareRef},
    routing::{Route, RouteEntry},
    scope::{Binding, Injectable, Lifetime, Scope, Token},
};
use futures::future::BoxFuture;
use std::sync::Arc;
use stratum_core::{AssemblyError, DynHandler, Handler, Params, ResolveError, Response};

/// Resolves a controller and runs one of its handlers.
pub(crate) trait Endpoint: Send + Sync {
    fn invoke<'a>(
        &'a self,
        scope: &'a Scope,
        params: Params,
    ) -> BoxFuture<'a, Result<Response, ResolveError>>;
}

struct ControllerEndpoint<C: Send + Sync + 'static> {
    token: Token<C>,
    handler: Arc<dyn DynHandler<C>>,
}

impl<C: Send + Sync + 'static> Endpoint for ControllerEndpoint<C> {
    fn invoke<'a>(
        &'a self,
        scope: &'a Scope,
        params: Params,
    ) -> BoxFuture<'a, Result<Response, ResolveError>> {
        Box::pin(async move {
            let controller = scope.resolve(&self.token)?;
            Ok(self.handler.handle_dyn(controller, params).await)
        })
    }
}

/// Anything that can contribute routes to an application.
///
/// Implemented by every [`ControllerDescriptor`]; applications hold their
/// controllers as `Box<dyn ControllerSource>`.
pub trait ControllerSource: Send + Sync {
    /// The controller's token name.
    fn name(&self) -> &str;

    /// Register bindings in `scope`, validate them, and return the routes.
    fn install(&self, scope: &Scope) -> Result<Vec<RouteEntry>, AssemblyError>;

    /// Resolve the controller now, surfacing construction failures early.
    fn resolve_eagerly(&self, scope: &Scope) -> Result<(), AssemblyError>;
}

/// Routes of one controller type.
pub struct ControllerDescriptor<C: Send + Sync + 'static> {
    token: Token<C>,
    binding: Option<Binding<C>>,
    singleton: bool,
    middleware: Vec<MiddlewareRef>,
    routes: Vec<(Route, Arc<dyn DynHandler<C>>)>,
}

impl<C: Send + Sync + 'static> ControllerDescriptor<C> {
    /// A descriptor for a controller already bound under `token`.
    pub fn new(token: Token<C>) -> Self {
        Self {
            token,
            binding: None,
            singleton: false,
            middleware: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Register `binding` during assembly unless the application's own
    /// scope already binds the token.
    pub fn with_binding(mut self, binding: Binding<C>) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Memoize the controller and resolve it during assembly.
    ///
    /// Applies to the binding installed in the application's own scope,
    /// whether it came from [`with_binding`](Self::with_binding) or was
    /// registered beforehand. A binding owned by an ancestor scope keeps
    /// the lifetime the ancestor gave it.
    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// Middleware run before every route of this controller, ahead of the
    /// route's own steps.
    pub fn with(mut self, middleware: MiddlewareRef) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Add a route served by `handler`.
    pub fn route<H: Handler<C>>(mut self, route: Route, handler: H) -> Self {
        let handler: Arc<dyn DynHandler<C>> = Arc::new(handler);
        self.routes.push((route, handler));
        self
    }

    /// The controller's token.
    pub fn token(&self) -> &Token<C> {
        &self.token
    }

    /// Declared routes.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|(route, _)| route)
    }

    fn unresolved(&self, source: ResolveError) -> AssemblyError {
        AssemblyError::Unresolved {
            component: format!("controller {}", self.token),
            source,
        }
    }
}

impl<C: Injectable> ControllerDescriptor<C> {
    /// A descriptor that binds `C` as a transient class if the scope has no
    /// binding for `token`.
    pub fn injectable(token: Token<C>) -> Self {
        Self::new(token).with_binding(Binding::class())
    }
}

impl<C: Send + Sync + 'static> ControllerSource for ControllerDescriptor<C> {
    fn name(&self) -> &str {
        self.token.name()
    }

    fn install(&self, scope: &Scope) -> Result<Vec<RouteEntry>, AssemblyError> {
        if let Some(binding) = &self.binding {
            if !scope.contains_local(&self.token) {
                scope.register(&self.token, binding.clone());
            }
        }
        if self.singleton {
            scope.set_lifetime(&self.token, Lifetime::Singleton);
            self.resolve_eagerly(scope)?;
        } else if !scope.contains(&self.token) {
            return Err(self.unresolved(ResolveError::UnresolvedToken {
                token: self.token.name().to_string(),
                chain: scope.chain(),
            }));
        }

        for middleware in &self.middleware {
            middleware.install(scope)?;
        }

        let mut entries = Vec::with_capacity(self.routes.len());
        for (route, handler) in &self.routes {
            for middleware in route.middleware() {
                middleware.install(scope)?;
            }
            let steps = self
                .middleware
                .iter()
                .chain(route.middleware())
                .cloned()
                .collect();
            entries.push(RouteEntry::new(
                route.pattern().clone(),
                format!("{}::{}", self.token, route.name()),
                route.bindings().to_vec(),
                MiddlewareChain::new(steps),
                Arc::new(ControllerEndpoint {
                    token: self.token.clone(),
                    handler: handler.clone(),
                }),
            ));
        }
        Ok(entries)
    }

    fn resolve_eagerly(&self, scope: &Scope) -> Result<(), AssemblyError> {
        scope
            .resolve(&self.token)
            .map(drop)
            .map_err(|source| self.unresolved(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stratum_core::{Event, ParamBinding};

    struct Greeter;

    impl Injectable for Greeter {
        fn construct(_scope: &Scope) -> Result<Self, ResolveError> {
            Ok(Greeter)
        }
    }

    impl Greeter {
        fn greet(&self, name: &str) -> Value {
            json!({ "message": format!("Hello, {name}!") })
        }
    }

    struct NeedsConfig;

    const GREETER: Token<Greeter> = Token::new("Greeter");
    const NEEDS_CONFIG: Token<NeedsConfig> = Token::new("NeedsConfig");

    fn greeter() -> ControllerDescriptor<Greeter> {
        ControllerDescriptor::injectable(GREETER).route(
            Route::post("greet").bind(ParamBinding::field("name")),
            |ctl: Arc<Greeter>, params: Params| async move {
                let name: String = params.get(0)?;
                Ok::<_, stratum_core::ExtractError>(ctl.greet(&name))
            },
        )
    }

    #[tokio::test]
    async fn test_install_registers_and_invokes() {
        let scope = Scope::root("app");
        let entries = greeter().install(&scope).unwrap();
        assert!(scope.contains_local(&GREETER));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].handler(), "Greeter::greet");

        let event = Event::post("/greet", json!({"name": "Ada"}));
        let params = Params::project(&event, entries[0].bindings());
        let response = entries[0].endpoint().invoke(&scope, params).await.unwrap();
        assert_eq!(response.as_value(), Some(&json!({"message": "Hello, Ada!"})));
    }

    #[test]
    fn test_missing_binding_fails_assembly() {
        let descriptor = ControllerDescriptor::new(NEEDS_CONFIG).route(
            Route::get("status"),
            |_: Arc<NeedsConfig>, _: Params| async { Value::Null },
        );
        let err = descriptor.install(&Scope::root("app")).unwrap_err();
        match err {
            AssemblyError::Unresolved { component, .. } => {
                assert_eq!(component, "controller NeedsConfig");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_singleton_resolved_eagerly() {
        let scope = Scope::root("app");
        scope.register_factory(&NEEDS_CONFIG, |_: &Scope| {
            Err(ResolveError::construction("NeedsConfig", "config file missing"))
        });
        let descriptor = ControllerDescriptor::new(NEEDS_CONFIG)
            .singleton()
            .route(Route::get("status"), |_: Arc<NeedsConfig>, _: Params| async {
                Value::Null
            });
        assert!(matches!(
            descriptor.install(&scope),
            Err(AssemblyError::Unresolved { .. })
        ));
    }

    #[test]
    fn test_existing_binding_is_kept() {
        let scope = Scope::root("app");
        scope.register_value(&GREETER, Arc::new(Greeter));
        greeter().singleton().install(&scope).unwrap();
        let a = scope.resolve(&GREETER).unwrap();
        let b = scope.resolve(&GREETER).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    fn counting_binding(built: &Arc<AtomicUsize>) -> Binding<Greeter> {
        let built = built.clone();
        Binding::factory(move |_: &Scope| {
            built.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Greeter))
        })
    }

    fn constructions_after_three_lookups(
        scope: &Scope,
        descriptor: ControllerDescriptor<Greeter>,
        built: &AtomicUsize,
    ) -> usize {
        descriptor.install(scope).unwrap();
        for _ in 0..3 {
            scope.resolve(&GREETER).unwrap();
        }
        built.load(Ordering::SeqCst)
    }

    #[test]
    fn test_singleton_memoizes_regardless_of_builder_order() {
        let built = Arc::new(AtomicUsize::new(0));
        let descriptor = ControllerDescriptor::new(GREETER)
            .singleton()
            .with_binding(counting_binding(&built));
        assert_eq!(
            constructions_after_three_lookups(&Scope::root("app"), descriptor, &built),
            1
        );

        let built = Arc::new(AtomicUsize::new(0));
        let descriptor = ControllerDescriptor::new(GREETER)
            .with_binding(counting_binding(&built))
            .singleton();
        assert_eq!(
            constructions_after_three_lookups(&Scope::root("app"), descriptor, &built),
            1
        );
    }

    #[test]
    fn test_singleton_memoizes_preregistered_transient() {
        let built = Arc::new(AtomicUsize::new(0));
        let scope = Scope::root("app");
        scope.register(&GREETER, counting_binding(&built));
        let descriptor = ControllerDescriptor::new(GREETER).singleton();
        assert_eq!(constructions_after_three_lookups(&scope, descriptor, &built), 1);
    }
}
