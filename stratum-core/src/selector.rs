//! Selectors and route patterns.
//!
//! A [`Selector`] is what an inbound [`Event`](crate::Event) asks for: a
//! verb-equivalent plus a path-equivalent. A [`RoutePattern`] is what a route
//! answers to. Matching is exact on both halves, with an explicit wildcard
//! for routes that want everything (the catch-all used by outer layers).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verb-equivalent half of a selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Read.
    Get,
    /// Create / submit.
    Post,
    /// Replace.
    Put,
    /// Partial update.
    Patch,
    /// Remove.
    Delete,
    /// Metadata read.
    Head,
    /// Capability query.
    Options,
    /// Any other verb, stored upper-cased.
    Custom(String),
}

impl Method {
    /// Returns the canonical upper-case name.
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Custom(name) => name,
        }
    }
}

impl From<&str> for Method {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            other => Method::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalizes a path-equivalent: leading `/`, no trailing `/` (except root).
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// The concrete (method, path) pair carried by an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    method: Method,
    path: String,
}

impl Selector {
    /// Create a selector; the path is normalized.
    pub fn new(method: impl Into<Method>, path: &str) -> Self {
        Self {
            method: method.into(),
            path: normalize_path(path),
        }
    }

    /// Shorthand for a `GET` selector.
    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    /// Shorthand for a `POST` selector.
    pub fn post(path: &str) -> Self {
        Self::new(Method::Post, path)
    }

    /// The verb-equivalent.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The normalized path-equivalent.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Method half of a [`RoutePattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodMatch {
    /// Matches every method.
    Any,
    /// Matches exactly this method.
    Exact(Method),
}

/// Path half of a [`RoutePattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathMatch {
    /// Matches every path.
    Any,
    /// Matches exactly this normalized path.
    Exact(String),
}

/// What a route answers to.
///
/// Two patterns are duplicates iff they are equal. Wildcards do not take
/// precedence over exact halves; the route table resolves overlaps purely by
/// registration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePattern {
    method: MethodMatch,
    path: PathMatch,
}

impl RoutePattern {
    /// Exact method, exact path.
    pub fn new(method: impl Into<Method>, path: &str) -> Self {
        Self {
            method: MethodMatch::Exact(method.into()),
            path: PathMatch::Exact(normalize_path(path)),
        }
    }

    /// Any method on an exact path.
    pub fn any_method(path: &str) -> Self {
        Self {
            method: MethodMatch::Any,
            path: PathMatch::Exact(normalize_path(path)),
        }
    }

    /// Catch-all: any method, any path.
    pub fn everything() -> Self {
        Self {
            method: MethodMatch::Any,
            path: PathMatch::Any,
        }
    }

    /// Method half.
    pub fn method(&self) -> &MethodMatch {
        &self.method
    }

    /// Path half.
    pub fn path(&self) -> &PathMatch {
        &self.path
    }

    /// Returns `true` if the selector satisfies both halves.
    pub fn matches(&self, selector: &Selector) -> bool {
        let method_ok = match &self.method {
            MethodMatch::Any => true,
            MethodMatch::Exact(m) => m == selector.method(),
        };
        let path_ok = match &self.path {
            PathMatch::Any => true,
            PathMatch::Exact(p) => p == selector.path(),
        };
        method_ok && path_ok
    }

    /// Returns `true` if every selector `other` matches is also matched by
    /// `self`.
    pub fn covers(&self, other: &RoutePattern) -> bool {
        let method_ok = match (&self.method, &other.method) {
            (MethodMatch::Any, _) => true,
            (MethodMatch::Exact(a), MethodMatch::Exact(b)) => a == b,
            (MethodMatch::Exact(_), MethodMatch::Any) => false,
        };
        let path_ok = match (&self.path, &other.path) {
            (PathMatch::Any, _) => true,
            (PathMatch::Exact(a), PathMatch::Exact(b)) => a == b,
            (PathMatch::Exact(_), PathMatch::Any) => false,
        };
        method_ok && path_ok
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            MethodMatch::Any => f.write_str("*")?,
            MethodMatch::Exact(m) => write!(f, "{m}")?,
        }
        match &self.path {
            PathMatch::Any => f.write_str(" *"),
            PathMatch::Exact(p) => write!(f, " {p}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("users"), "/users");
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::from("get"), Method::Get);
        assert_eq!(Method::from("Post"), Method::Post);
        assert_eq!(Method::from("purge"), Method::Custom("PURGE".into()));
    }

    #[test]
    fn test_exact_pattern() {
        let pattern = RoutePattern::new(Method::Get, "world");
        assert!(pattern.matches(&Selector::get("/world")));
        assert!(!pattern.matches(&Selector::post("/world")));
        assert!(!pattern.matches(&Selector::get("/worlds")));
    }

    #[test]
    fn test_covers() {
        let everything = RoutePattern::everything();
        let any_items = RoutePattern::any_method("/items");
        let get_items = RoutePattern::new(Method::Get, "/items");

        assert!(everything.covers(&get_items));
        assert!(everything.covers(&any_items));
        assert!(any_items.covers(&get_items));
        assert!(get_items.covers(&get_items));
        assert!(!get_items.covers(&any_items));
        assert!(!get_items.covers(&RoutePattern::new(Method::Post, "/items")));
        assert!(!any_items.covers(&everything));
    }

    #[test]
    fn test_everything_pattern() {
        let pattern = RoutePattern::everything();
        assert!(pattern.matches(&Selector::get("/a")));
        assert!(pattern.matches(&Selector::new("DELETE", "/b/c")));
        assert_eq!(pattern.to_string(), "* *");
    }

    #[test]
    fn test_any_method_pattern() {
        let pattern = RoutePattern::any_method("/users");
        assert!(pattern.matches(&Selector::post("users")));
        assert!(!pattern.matches(&Selector::post("profile")));
    }
}
