//! # Dependency Scope
//!
//! A [`Scope`] maps [`Token`]s to [`Binding`]s and may have a parent. Lookup
//! checks the scope's own bindings first, then walks the parent chain;
//! failing everywhere is an [`ResolveError::UnresolvedToken`] naming every
//! scope searched.
//!
//! Children see their ancestors' bindings but never the reverse, and
//! registering in a child shadows the ancestor's binding for that child and
//! its descendants only. This is how layered applications share a root
//! (a logger, a delegate to the next layer) while each keeps private
//! bindings of its own.
//!
//! ```rust
//! use std::sync::Arc;
//! use stratum_std::scope::{Scope, Token};
//!
//! const SHARED: Token<String> = Token::new("Shared");
//!
//! let root = Scope::root("root");
//! root.register_value(&SHARED, Arc::new("from root".to_string()));
//!
//! let child = root.create_child("business");
//! assert_eq!(*child.resolve(&SHARED).unwrap(), "from root");
//!
//! child.register_value(&SHARED, Arc::new("shadowed".to_string()));
//! assert_eq!(*child.resolve(&SHARED).unwrap(), "shadowed");
//! assert_eq!(*root.resolve(&SHARED).unwrap(), "from root");
//! ```
//!
//! A child holds only a weak reference to its parent: whoever composes the
//! layers owns the root. Resolving through a dropped parent reports it as
//! `<dropped>` in the searched chain.

mod binding;
mod token;

pub use binding::{Binding, Injectable, Lifetime};
pub use token::Token;

use binding::{BindingKind, Instance};
use parking_lot::{Mutex, RwLock};
use std::{
    any::type_name,
    collections::HashMap,
    fmt,
    sync::{Arc, Weak},
};
use stratum_core::ResolveError;

struct Entry {
    kind: BindingKind,
    lifetime: Lifetime,
    type_name: &'static str,
    memo: Mutex<Option<Instance>>,
}

impl Entry {
    fn instantiate(&self, requesting: &Scope, owner: &Scope) -> Result<Instance, ResolveError> {
        let construct = match &self.kind {
            BindingKind::Value(value) => return Ok(value.clone()),
            BindingKind::Factory(construct) | BindingKind::Class(construct) => construct,
        };
        match self.lifetime {
            Lifetime::Transient => construct(requesting),
            Lifetime::Singleton => {
                // Held across construction so concurrent first lookups build once.
                let mut memo = self.memo.lock();
                if let Some(instance) = memo.as_ref() {
                    return Ok(instance.clone());
                }
                let instance = construct(owner)?;
                *memo = Some(instance.clone());
                Ok(instance)
            }
        }
    }
}

struct ScopeInner {
    name: String,
    parent: Option<Weak<ScopeInner>>,
    bindings: RwLock<HashMap<String, Arc<Entry>>>,
}

/// A handle to one level of the dependency hierarchy.
///
/// Cloning the handle shares the same scope.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// A scope without a parent.
    pub fn root(name: impl Into<String>) -> Self {
        Self::with_parent(name.into(), None)
    }

    fn with_parent(name: String, parent: Option<Weak<ScopeInner>>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                name,
                parent,
                bindings: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create a child that inherits every binding of `self`.
    pub fn create_child(&self, name: impl Into<String>) -> Scope {
        Self::with_parent(name.into(), Some(Arc::downgrade(&self.inner)))
    }

    /// This scope's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The parent, if there is one and it is still alive.
    pub fn parent(&self) -> Option<Scope> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Scope { inner })
    }

    /// Bind `token` in this scope, replacing any local binding silently.
    pub fn register<T>(&self, token: &Token<T>, binding: Binding<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let entry = Entry {
            kind: binding.kind,
            lifetime: binding.lifetime,
            type_name: type_name::<T>(),
            memo: Mutex::new(None),
        };
        self.inner
            .bindings
            .write()
            .insert(token.name().to_string(), Arc::new(entry));
    }

    /// Shorthand for registering a [`Binding::value`].
    pub fn register_value<T>(&self, token: &Token<T>, value: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register(token, Binding::value(value));
    }

    /// Shorthand for registering a transient [`Binding::factory`].
    pub fn register_factory<T, F>(&self, token: &Token<T>, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Scope) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        self.register(token, Binding::factory(factory));
    }

    /// Shorthand for registering a [`Binding::class`] with `lifetime`.
    pub fn register_class<T: Injectable>(&self, token: &Token<T>, lifetime: Lifetime) {
        self.register(token, Binding::<T>::class().with_lifetime(lifetime));
    }

    /// Change the lifetime of this scope's own binding for `token`.
    ///
    /// Returns `false` if the binding lives in an ancestor or nowhere.
    /// Switching lifetimes drops any memoized instance; setting the current
    /// lifetime again keeps it.
    pub fn set_lifetime<T: ?Sized>(&self, token: &Token<T>, lifetime: Lifetime) -> bool {
        let mut bindings = self.inner.bindings.write();
        let Some(entry) = bindings.get_mut(token.name()) else {
            return false;
        };
        if entry.lifetime != lifetime {
            *entry = Arc::new(Entry {
                kind: entry.kind.clone(),
                lifetime,
                type_name: entry.type_name,
                memo: Mutex::new(None),
            });
        }
        true
    }

    /// Remove this scope's own binding for `token`. Ancestors are untouched.
    pub fn unregister<T: ?Sized>(&self, token: &Token<T>) -> bool {
        self.inner.bindings.write().remove(token.name()).is_some()
    }

    /// Returns `true` if `token` is bound here or in any live ancestor.
    pub fn contains<T: ?Sized>(&self, token: &Token<T>) -> bool {
        self.lookup(token.name()).is_ok()
    }

    /// Returns `true` if `token` is bound in this scope itself.
    pub fn contains_local<T: ?Sized>(&self, token: &Token<T>) -> bool {
        self.inner.bindings.read().contains_key(token.name())
    }

    /// Resolve `token` through this scope and its ancestors.
    pub fn resolve<T>(&self, token: &Token<T>) -> Result<Arc<T>, ResolveError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let (entry, owner) = self.lookup(token.name())?;
        let instance = entry.instantiate(self, &owner)?;
        instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| ResolveError::TypeMismatch {
                token: token.name().to_string(),
                expected: type_name::<T>(),
                found: entry.type_name,
            })
    }

    /// Like [`resolve`](Self::resolve), but a missing binding is `Ok(None)`.
    ///
    /// Other failures (type mismatch, construction) are still errors.
    pub fn resolve_optional<T>(&self, token: &Token<T>) -> Result<Option<Arc<T>>, ResolveError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.resolve(token) {
            Ok(value) => Ok(Some(value)),
            Err(ResolveError::UnresolvedToken { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Names of this scope and its live ancestors, innermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut names = vec![self.name().to_string()];
        let mut current = self.parent();
        while let Some(scope) = current {
            names.push(scope.name().to_string());
            current = scope.parent();
        }
        names
    }

    fn lookup(&self, name: &str) -> Result<(Arc<Entry>, Scope), ResolveError> {
        let mut searched = Vec::new();
        let mut current = Some(self.inner.clone());
        while let Some(scope) = current {
            searched.push(scope.name.clone());
            let entry = scope.bindings.read().get(name).cloned();
            if let Some(entry) = entry {
                return Ok((entry, Scope { inner: scope }));
            }
            current = match &scope.parent {
                Some(weak) => {
                    let parent = weak.upgrade();
                    if parent.is_none() {
                        searched.push("<dropped>".to_string());
                    }
                    parent
                }
                None => None,
            };
        }
        Err(ResolveError::UnresolvedToken {
            token: name.to_string(),
            chain: searched,
        })
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<String> = self.inner.bindings.read().keys().cloned().collect();
        bound.sort();
        f.debug_struct("Scope")
            .field("name", &self.inner.name)
            .field("bindings", &bound)
            .field("parent", &self.parent().map(|p| p.name().to_string()))
            .finish()
    }
}
