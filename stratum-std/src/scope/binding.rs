//! Binding kinds and lifetimes.

use super::Scope;
use serde::{Deserialize, Serialize};
use std::{any::Any, marker::PhantomData, sync::Arc};
use stratum_core::ResolveError;

/// A type-erased instance. The concrete type is always `Arc<T>`.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type Constructor =
    Arc<dyn Fn(&Scope) -> Result<Instance, ResolveError> + Send + Sync>;

/// How often a factory or class binding runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// Every lookup constructs a fresh instance, using the requesting scope.
    #[default]
    Transient,
    /// Constructed once, memoized in the scope that owns the binding.
    Singleton,
}

/// A type that builds itself from a scope.
///
/// This is the class-binding equivalent of a constructor with injected
/// arguments: resolve whatever you need from `scope` and return `Self`.
///
/// ```rust
/// use stratum_core::ResolveError;
/// use stratum_std::scope::{Injectable, Scope, Token};
///
/// const GREETING: Token<String> = Token::new("Greeting");
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// impl Injectable for Greeter {
///     fn construct(scope: &Scope) -> Result<Self, ResolveError> {
///         let greeting = scope.resolve(&GREETING)?;
///         Ok(Self { greeting: greeting.to_string() })
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be constructed from a scope",
    label = "missing `Injectable` implementation",
    note = "Implement `Injectable::construct`, or bind a value or factory instead."
)]
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Build an instance, resolving dependencies from `scope`.
    fn construct(scope: &Scope) -> Result<Self, ResolveError>;
}

#[derive(Clone)]
pub(crate) enum BindingKind {
    Value(Instance),
    Factory(Constructor),
    Class(Constructor),
}

/// What a token is bound to.
pub struct Binding<T: ?Sized> {
    pub(crate) kind: BindingKind,
    pub(crate) lifetime: Lifetime,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Binding<T> {
    /// A fixed, already-built value.
    pub fn value(value: Arc<T>) -> Self {
        Self::from_kind(BindingKind::Value(Arc::new(value)))
    }

    /// A factory run on lookup. Transient unless [`singleton`](Self::singleton) is called.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Scope) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        Self::from_kind(BindingKind::Factory(Arc::new(move |scope| {
            factory(scope).map(|value| Arc::new(value) as Instance)
        })))
    }

    /// Memoize the result. Has no effect on value bindings.
    pub fn singleton(self) -> Self {
        self.with_lifetime(Lifetime::Singleton)
    }

    /// Set the lifetime explicitly.
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// The configured lifetime.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    fn from_kind(kind: BindingKind) -> Self {
        Self {
            kind,
            lifetime: Lifetime::Transient,
            _marker: PhantomData,
        }
    }
}

impl<T: Injectable> Binding<T> {
    /// A class binding: `T::construct` runs with the requesting scope.
    pub fn class() -> Self {
        Self::from_kind(BindingKind::Class(Arc::new(|scope| {
            T::construct(scope).map(|value| Arc::new(Arc::new(value)) as Instance)
        })))
    }
}

impl<T: ?Sized> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            lifetime: self.lifetime,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            BindingKind::Value(_) => "value",
            BindingKind::Factory(_) => "factory",
            BindingKind::Class(_) => "class",
        };
        f.debug_struct("Binding")
            .field("kind", &kind)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
