//! # Middleware Chain
//!
//! A route carries an ordered list of [`MiddlewareRef`]s. Each reference
//! names a middleware type by [`Token`] plus the method to call on it; the
//! instance is resolved from the application's scope when the step runs.
//!
//! Steps run strictly in declared order, each one awaited before the next.
//! The first failing step ends the chain and the handler never runs.
//!
//! ```rust,ignore
//! Route::everything("forward")
//!     .with(MiddlewareRef::method(SECURITY, "check_security", |m, event| {
//!         Box::pin(m.check_security(event))
//!     }))
//! ```

use crate::scope::{Binding, Injectable, Scope, Token};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{any::Any, collections::HashMap, fmt, sync::Arc};
use stratum_core::{AssemblyError, BoxError, DispatchError, Event, Middleware, ResolveError};

type Instance = Arc<dyn Any + Send + Sync>;

/// How middleware instances are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddlewareScope {
    /// Resolved from the scope for every step invocation.
    #[default]
    PerInvocation,
    /// Resolved once per application and reused by every route.
    Shared,
}

trait Step: Send + Sync {
    fn token(&self) -> &str;
    fn install(&self, scope: &Scope) -> Result<(), AssemblyError>;
    fn resolve(&self, scope: &Scope) -> Result<Instance, ResolveError>;
    fn run<'a>(&'a self, instance: Instance, event: &'a Event)
    -> BoxFuture<'a, Result<(), BoxError>>;
}

type StepFn<M> = dyn for<'a> Fn(&'a M, &'a Event) -> BoxFuture<'a, Result<(), BoxError>>
    + Send
    + Sync;

struct TypedStep<M: Send + Sync + 'static> {
    token: Token<M>,
    binding: Option<Binding<M>>,
    call: Box<StepFn<M>>,
}

impl<M: Send + Sync + 'static> Step for TypedStep<M> {
    fn token(&self) -> &str {
        self.token.name()
    }

    fn install(&self, scope: &Scope) -> Result<(), AssemblyError> {
        if let Some(binding) = &self.binding {
            if !scope.contains(&self.token) {
                scope.register(&self.token, binding.clone());
            }
        }
        if scope.contains(&self.token) {
            return Ok(());
        }
        Err(AssemblyError::Unresolved {
            component: format!("middleware {}", self.token),
            source: ResolveError::UnresolvedToken {
                token: self.token.name().to_string(),
                chain: scope.chain(),
            },
        })
    }

    fn resolve(&self, scope: &Scope) -> Result<Instance, ResolveError> {
        scope
            .resolve(&self.token)
            .map(|instance| Arc::new(instance) as Instance)
    }

    fn run<'a>(
        &'a self,
        instance: Instance,
        event: &'a Event,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async move {
            let middleware = instance
                .downcast_ref::<Arc<M>>()
                .cloned()
                .ok_or_else(|| format!("instance bound to `{}` has the wrong type", self.token))?;
            (self.call)(middleware.as_ref(), event).await
        })
    }
}

/// One named middleware step.
#[derive(Clone)]
pub struct MiddlewareRef {
    label: String,
    scope: Option<MiddlewareScope>,
    step: Arc<dyn Step>,
}

impl MiddlewareRef {
    /// A step calling [`Middleware::before`] on the instance bound to `token`.
    pub fn of<M: Middleware>(token: Token<M>) -> Self {
        Self::method(token, "before", call_before::<M>)
    }

    /// A step calling an arbitrary async method on the instance bound to `token`.
    ///
    /// `name` only labels the step in logs and rejection messages.
    pub fn method<M, F>(token: Token<M>, name: &str, call: F) -> Self
    where
        M: Send + Sync + 'static,
        F: for<'a> Fn(&'a M, &'a Event) -> BoxFuture<'a, Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        Self::from_step(token, None, name, Box::new(call))
    }

    fn from_step<M: Send + Sync + 'static>(
        token: Token<M>,
        binding: Option<Binding<M>>,
        name: &str,
        call: Box<StepFn<M>>,
    ) -> Self {
        Self {
            label: format!("{token}::{name}"),
            scope: None,
            step: Arc::new(TypedStep {
                token,
                binding,
                call,
            }),
        }
    }

    /// `Type::method` label of this step.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Token of the middleware type.
    pub fn token(&self) -> &str {
        self.step.token()
    }

    /// Override the application's default [`MiddlewareScope`] for this step.
    pub fn with_scope(mut self, scope: MiddlewareScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Shorthand for `with_scope(MiddlewareScope::Shared)`.
    pub fn shared(self) -> Self {
        self.with_scope(MiddlewareScope::Shared)
    }

    /// The explicit scope override, if any.
    pub fn scope(&self) -> Option<MiddlewareScope> {
        self.scope
    }

    pub(crate) fn install(&self, scope: &Scope) -> Result<(), AssemblyError> {
        self.step.install(scope)
    }
}

impl MiddlewareRef {
    /// Like [`of`](Self::of), registering `M` as a class binding when the
    /// scope has none.
    pub fn injectable<M: Middleware + Injectable>(token: Token<M>) -> Self {
        Self::from_step(
            token,
            Some(Binding::class()),
            "before",
            Box::new(call_before::<M>),
        )
    }
}

fn call_before<'a, M: Middleware>(
    middleware: &'a M,
    event: &'a Event,
) -> BoxFuture<'a, Result<(), BoxError>> {
    Box::pin(middleware.before(event))
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareRef")
            .field("label", &self.label)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Instances of [`MiddlewareScope::Shared`] steps, one per token per application.
#[derive(Default)]
pub struct SharedInstances {
    instances: Mutex<HashMap<String, Instance>>,
}

impl SharedInstances {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached instances.
    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    /// Returns `true` if nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }

    fn get_or_resolve(&self, step: &dyn Step, scope: &Scope) -> Result<Instance, ResolveError> {
        let mut instances = self.instances.lock();
        if let Some(instance) = instances.get(step.token()) {
            return Ok(instance.clone());
        }
        let instance = step.resolve(scope)?;
        instances.insert(step.token().to_string(), instance.clone());
        Ok(instance)
    }
}

/// The ordered middleware of one route.
#[derive(Clone, Default, Debug)]
pub struct MiddlewareChain {
    steps: Vec<MiddlewareRef>,
}

impl MiddlewareChain {
    /// A chain running `steps` in order.
    pub fn new(steps: Vec<MiddlewareRef>) -> Self {
        Self { steps }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if there are no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The steps, in execution order.
    pub fn steps(&self) -> &[MiddlewareRef] {
        &self.steps
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// A step whose instance cannot be resolved fails the chain with
    /// [`DispatchError::Resolve`]; a step that returns an error fails it
    /// with [`DispatchError::MiddlewareRejected`].
    pub async fn run(
        &self,
        event: &Event,
        scope: &Scope,
        shared: &SharedInstances,
        default_scope: MiddlewareScope,
    ) -> Result<(), DispatchError> {
        for step in &self.steps {
            let instance = match step.scope.unwrap_or(default_scope) {
                MiddlewareScope::PerInvocation => step.step.resolve(scope)?,
                MiddlewareScope::Shared => shared.get_or_resolve(step.step.as_ref(), scope)?,
            };
            step.step
                .run(instance, event)
                .await
                .map_err(|err| DispatchError::MiddlewareRejected {
                    middleware: step.label.clone(),
                    reason: err.to_string(),
                })?;
        }
        Ok(())
    }
}
