//! # Event
//!
//! One inbound occurrence plus its accumulating response stack.
//!
//! [`Event`] is a reference-counted handle: cloning it is O(1) and the clone
//! observes the *same* occurrence. This is what lets a Delegate Event Source
//! hand an event to another layer while preserving identity: the inner
//! layer sees whatever the outer layer already appended.
//!
//! Everything except the response stack is immutable after construction.

use crate::{
    response::{Response, ResponseStack},
    selector::{Method, Selector},
};
use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, sync::Arc};
use uuid::Uuid;

/// Unique identifier of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(Uuid);

impl EventId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Headers/query/body-equivalent of an event.
///
/// Header names are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    headers: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    body: Value,
}

impl Payload {
    /// An empty payload with a `null` body.
    pub fn new() -> Self {
        Self::default()
    }

    /// A payload carrying only a JSON body.
    pub fn json(body: Value) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Add a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Replace the body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// All headers.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Query parameter lookup.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// The body.
    pub fn body(&self) -> &Value {
        &self.body
    }
}

struct EventInner {
    id: EventId,
    selector: Selector,
    payload: Payload,
    responses: Mutex<Vec<Response>>,
}

/// A shared handle to one inbound occurrence.
///
/// # Example
///
/// ```rust
/// use stratum_core::{Event, Response};
/// use serde_json::json;
///
/// let event = Event::post("/echo", json!({"name": "Alice"}));
/// let seen_by_inner_layer = event.clone();
/// seen_by_inner_layer.push_response(Response::value(json!({"ok": true})));
///
/// assert!(event.same_event(&seen_by_inner_layer));
/// assert_eq!(event.responses().len(), 1);
/// ```
#[derive(Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

impl Event {
    /// Create an event with a fresh id and an empty response stack.
    pub fn new(selector: Selector, payload: Payload) -> Self {
        Self {
            inner: Arc::new(EventInner {
                id: EventId::new(),
                selector,
                payload,
                responses: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A `GET` event with an empty payload.
    pub fn get(path: &str) -> Self {
        Self::new(Selector::new(Method::Get, path), Payload::new())
    }

    /// A `POST` event with a JSON body.
    pub fn post(path: &str, body: Value) -> Self {
        Self::new(Selector::new(Method::Post, path), Payload::json(body))
    }

    /// The event's id.
    pub fn id(&self) -> EventId {
        self.inner.id
    }

    /// The selector used for routing.
    pub fn selector(&self) -> &Selector {
        &self.inner.selector
    }

    /// The payload.
    pub fn payload(&self) -> &Payload {
        &self.inner.payload
    }

    /// Shorthand for `payload().body()`.
    pub fn body(&self) -> &Value {
        self.inner.payload.body()
    }

    /// Append a response. This is the only mutation an event allows.
    pub fn push_response(&self, response: Response) {
        self.lock_responses().push(response);
    }

    /// Snapshot of the response stack.
    pub fn responses(&self) -> ResponseStack {
        ResponseStack::from(self.lock_responses().clone())
    }

    /// Number of responses recorded so far.
    pub fn response_count(&self) -> usize {
        self.lock_responses().len()
    }

    /// Returns `true` if both handles refer to the same occurrence.
    pub fn same_event(&self, other: &Event) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock_responses(&self) -> MutexGuard<'_, Vec<Response>> {
        self.inner.responses.lock()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.inner.id)
            .field("selector", &self.inner.selector)
            .field("payload", &self.inner.payload)
            .field("responses", &self.response_count())
            .finish()
    }
}
