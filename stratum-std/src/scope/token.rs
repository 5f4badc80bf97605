//! Typed lookup keys.

use std::{borrow::Cow, fmt, marker::PhantomData, sync::Arc};

/// A named key for one binding in a [`Scope`](super::Scope).
///
/// The type parameter fixes what a lookup returns; the name is what scopes
/// actually store. `T` may be unsized, so trait objects can be bound:
///
/// ```rust
/// use stratum_core::Logger;
/// use stratum_std::scope::Token;
///
/// const LOGGER: Token<dyn Logger> = Token::new("Logger");
/// assert_eq!(LOGGER.name(), "Logger");
/// ```
pub struct Token<T: ?Sized> {
    name: Cow<'static, str>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> Token<T> {
    /// A token with a static name, usable in `const` items.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _marker: PhantomData,
        }
    }

    /// A token with a name built at runtime.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _marker: PhantomData,
        }
    }

    /// The binding name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: ?Sized> Clone for Token<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&self.name).finish()
    }
}

impl<T: ?Sized> fmt::Display for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl<T: ?Sized> PartialEq for Token<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T: ?Sized> Eq for Token<T> {}
