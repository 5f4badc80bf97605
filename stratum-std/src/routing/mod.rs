//! # Routing
//!
//! Routes are declared per controller with [`Route`] and collected into a
//! [`RouteTable`] when an application is assembled.
//!
//! # Matching Rules
//!
//! | Pattern | Matches |
//! |---------|---------|
//! | `Route::get("users")` | `GET /users` only |
//! | `Route::any("users")` | every method on `/users` |
//! | `Route::everything("forward")` | every selector |
//!
//! Lookup walks routes in registration order and the first match wins;
//! wildcards get no special priority. Registering two routes with an
//! identical pattern is an assembly error.

mod route;
mod table;

pub use route::Route;
pub use table::{RouteEntry, RouteTable, RouteTableBuilder};

/// Result of a route table lookup.
#[derive(Debug)]
pub enum RouteResult<'a, V> {
    /// A route was found.
    Matched(&'a V),
    /// No route matches.
    NotFound,
}

impl<'a, V> RouteResult<'a, V> {
    /// The matched value, if any.
    pub fn matched(self) -> Option<&'a V> {
        match self {
            RouteResult::Matched(v) => Some(v),
            RouteResult::NotFound => None,
        }
    }

    /// Returns `true` if a route was found.
    pub fn is_matched(&self) -> bool {
        matches!(self, RouteResult::Matched(_))
    }
}
