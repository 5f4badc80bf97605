//! Responses and response conversion.

use crate::error::{BoxError, DispatchError, ExtractError, ResolveError};
use serde::Serialize;
use serde_json::{Value, json};

/// Classification of a failure recorded on the response stack.
///
/// Event sources map these onto whatever their transport needs (a
/// "not found", a "forbidden", ...) without downcasting error values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No route matched the selector.
    RouteNotFound,
    /// A middleware step failed or declined.
    MiddlewareRejected,
    /// A delegate event source forwarded before its layer was started.
    NoDispatcherBound,
    /// Parameters could not be projected into what the handler asked for.
    ExtractionFailed,
    /// A controller or middleware could not be resolved at first use.
    Unresolved,
    /// The handler itself failed.
    HandlerFailed,
}

/// An error entry on the response stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Failure class.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
}

/// One entry of an event's response stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// A handler's successful result.
    Value(Value),
    /// A failure captured on the event's path.
    Error(ErrorResponse),
}

impl Response {
    /// A successful value.
    pub fn value(value: Value) -> Self {
        Response::Value(value)
    }

    /// An error entry.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error(ErrorResponse {
            kind,
            message: message.into(),
        })
    }

    /// Returns `true` for error entries.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// The error kind, if this is an error entry.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Response::Error(e) => Some(e.kind),
            Response::Value(_) => None,
        }
    }

    /// The value, if this is a successful entry.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Response::Value(v) => Some(v),
            Response::Error(_) => None,
        }
    }

    /// Render as JSON. Errors become `{"error": kind, "message": ...}`.
    pub fn to_json(&self) -> Value {
        match self {
            Response::Value(v) => v.clone(),
            Response::Error(e) => json!({ "error": e.kind, "message": e.message }),
        }
    }
}

impl From<&DispatchError> for Response {
    fn from(err: &DispatchError) -> Self {
        Response::error(err.kind(), err.to_string())
    }
}

/// Ordered responses recorded for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseStack(Vec<Response>);

impl ResponseStack {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in recording order.
    pub fn iter(&self) -> std::slice::Iter<'_, Response> {
        self.0.iter()
    }

    /// The first recorded entry.
    pub fn first(&self) -> Option<&Response> {
        self.0.first()
    }

    /// The most recent entry: the final answer of the innermost completed step.
    pub fn last(&self) -> Option<&Response> {
        self.0.last()
    }

    /// The most recent entry, if it is a value.
    pub fn last_value(&self) -> Option<&Value> {
        self.last().and_then(Response::as_value)
    }

    /// Consume and return the most recent entry.
    pub fn into_last(mut self) -> Option<Response> {
        self.0.pop()
    }

    /// Borrow the entries.
    pub fn as_slice(&self) -> &[Response] {
        &self.0
    }

    /// Consume into the underlying vector.
    pub fn into_vec(self) -> Vec<Response> {
        self.0
    }
}

impl From<Vec<Response>> for ResponseStack {
    fn from(value: Vec<Response>) -> Self {
        Self(value)
    }
}

impl<'a> IntoIterator for &'a ResponseStack {
    type Item = &'a Response;
    type IntoIter = std::slice::Iter<'a, Response>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Serialize-on-return wrapper for typed handler results.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

/// Trait for converting a handler's output into a [`Response`].
///
/// # Default Implementations
///
/// - `()` → `null`
/// - [`Value`], `String`, `&'static str` → value
/// - [`Json<T>`] → serialized value (serialization failure is a handler failure)
/// - [`Response`] → as is (lets a layer forward an inner layer's answer untouched)
/// - `Option<T>` → inner, or `null`
/// - `Result<T, E>` → inner, or an error entry; a [`DispatchError`] keeps its kind
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `IntoResponse`",
    label = "missing `IntoResponse` implementation",
    note = "Handlers must return a type that converts into a `Response`."
)]
pub trait IntoResponse {
    /// Convert the output into a response entry.
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for Value {
    fn into_response(self) -> Response {
        Response::Value(self)
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Response {
        Response::Value(Value::Null)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::Value(Value::String(self))
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::Value(Value::String(self.to_string()))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_value(&self.0) {
            Ok(v) => Response::Value(v),
            Err(e) => Response::error(ErrorKind::HandlerFailed, e.to_string()),
        }
    }
}

impl<T: IntoResponse> IntoResponse for Option<T> {
    fn into_response(self) -> Response {
        match self {
            Some(t) => t.into_response(),
            None => Response::Value(Value::Null),
        }
    }
}

impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: Into<BoxError>,
{
    fn into_response(self) -> Response {
        match self {
            Ok(t) => t.into_response(),
            Err(e) => failure_response(e.into()),
        }
    }
}

/// Turn a boxed failure into an error entry.
///
/// A forwarded [`DispatchError`] keeps its kind, and extraction or
/// resolution failures raised inside a handler are classified as such.
/// Anything else is [`ErrorKind::HandlerFailed`].
pub fn failure_response(err: BoxError) -> Response {
    if let Some(dispatch) = err.downcast_ref::<DispatchError>() {
        return Response::from(dispatch);
    }
    let kind = if err.is::<ExtractError>() {
        ErrorKind::ExtractionFailed
    } else if err.is::<ResolveError>() {
        ErrorKind::Unresolved
    } else {
        ErrorKind::HandlerFailed
    };
    Response::error(kind, err.to_string())
}
