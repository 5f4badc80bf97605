//! Route declarations.

use crate::middleware::MiddlewareRef;
use stratum_core::{Method, MethodMatch, ParamBinding, RoutePattern};

/// One route of a controller: what it answers to, how parameters are
/// projected, and which middleware guards it.
///
/// The method-style constructors take the handler's name and derive the
/// path from it, so `Route::get("users")` answers `GET /users`. Use
/// [`at`](Route::at) when the path differs from the name.
#[derive(Debug, Clone)]
pub struct Route {
    pattern: RoutePattern,
    name: String,
    bindings: Vec<ParamBinding>,
    middleware: Vec<MiddlewareRef>,
}

impl Route {
    /// A route with an explicit pattern.
    pub fn new(pattern: RoutePattern, name: impl Into<String>) -> Self {
        Self {
            pattern,
            name: name.into(),
            bindings: Vec::new(),
            middleware: Vec::new(),
        }
    }

    /// `GET /{name}`.
    pub fn get(name: &str) -> Self {
        Self::new(RoutePattern::new(Method::Get, name), name)
    }

    /// `POST /{name}`.
    pub fn post(name: &str) -> Self {
        Self::new(RoutePattern::new(Method::Post, name), name)
    }

    /// `PUT /{name}`.
    pub fn put(name: &str) -> Self {
        Self::new(RoutePattern::new(Method::Put, name), name)
    }

    /// `PATCH /{name}`.
    pub fn patch(name: &str) -> Self {
        Self::new(RoutePattern::new(Method::Patch, name), name)
    }

    /// `DELETE /{name}`.
    pub fn delete(name: &str) -> Self {
        Self::new(RoutePattern::new(Method::Delete, name), name)
    }

    /// Any method on `/{name}`.
    pub fn any(name: &str) -> Self {
        Self::new(RoutePattern::any_method(name), name)
    }

    /// Every selector. Typical for an outer layer that forwards inward.
    pub fn everything(name: &str) -> Self {
        Self::new(RoutePattern::everything(), name)
    }

    /// Answer on `path` instead of the path derived from the name.
    pub fn at(mut self, path: &str) -> Self {
        self.pattern = match self.pattern.method() {
            MethodMatch::Any => RoutePattern::any_method(path),
            MethodMatch::Exact(method) => RoutePattern::new(method.clone(), path),
        };
        self
    }

    /// Append a parameter binding. Parameters arrive in declaration order.
    pub fn bind(mut self, binding: ParamBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Append a middleware step. Steps run in declaration order.
    pub fn with(mut self, middleware: MiddlewareRef) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// The pattern.
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// The handler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter bindings.
    pub fn bindings(&self) -> &[ParamBinding] {
        &self.bindings
    }

    /// Declared middleware.
    pub fn middleware(&self) -> &[MiddlewareRef] {
        &self.middleware
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::Selector;

    #[test]
    fn test_path_from_name() {
        let route = Route::post("createUser");
        assert!(route.pattern().matches(&Selector::post("/createUser")));
        assert_eq!(route.name(), "createUser");
    }

    #[test]
    fn test_at_keeps_method() {
        let route = Route::get("list_users").at("/users");
        assert!(route.pattern().matches(&Selector::get("/users")));
        assert!(!route.pattern().matches(&Selector::post("/users")));

        let any = Route::any("users").at("people");
        assert!(any.pattern().matches(&Selector::new("DELETE", "/people")));
    }

    #[test]
    fn test_bindings_keep_order() {
        let route = Route::post("echo")
            .bind(ParamBinding::Body)
            .bind(ParamBinding::FullEvent);
        assert_eq!(
            route.bindings(),
            &[ParamBinding::Body, ParamBinding::FullEvent]
        );
    }
}
