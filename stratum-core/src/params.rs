//! # Parameter Binding
//!
//! A route declares how its handler wants the event projected: the whole
//! event, the whole body, or individual fields. [`Params::project`] performs
//! that projection. It is a pure data-shape transform: it never fails and
//! never touches the event's response stack. Typed access (and therefore
//! any failure) happens when the handler reads a parameter.
//!
//! ```rust
//! use stratum_core::{Event, ParamBinding, Params};
//! use serde_json::json;
//!
//! let event = Event::post("/echo", json!({"name": "Alice", "age": 30}));
//! let params = Params::project(
//!     &event,
//!     &[ParamBinding::Body, ParamBinding::field("name")],
//! );
//!
//! assert_eq!(params.value(0).unwrap(), &json!({"name": "Alice", "age": 30}));
//! assert_eq!(params.get::<String>(1).unwrap(), "Alice");
//! ```

use crate::{error::ExtractError, event::Event};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// How one handler parameter is taken from the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamBinding {
    /// The event handle itself (identity preserved).
    FullEvent,
    /// The whole body.
    Body,
    /// A body field. Names starting with `/` are JSON pointers.
    Field(String),
    /// A header value (string), `null` when absent.
    Header(String),
    /// A query parameter (string), `null` when absent.
    Query(String),
}

impl ParamBinding {
    /// A body field binding.
    pub fn field(name: impl Into<String>) -> Self {
        ParamBinding::Field(name.into())
    }

    /// A header binding.
    pub fn header(name: impl Into<String>) -> Self {
        ParamBinding::Header(name.into())
    }

    /// A query binding.
    pub fn query(name: impl Into<String>) -> Self {
        ParamBinding::Query(name.into())
    }
}

/// One projected parameter.
#[derive(Debug, Clone)]
pub enum Param {
    /// From [`ParamBinding::FullEvent`].
    Event(Event),
    /// From every other binding.
    Value(Value),
}

/// The projected parameters of one handler invocation, in declared order.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: Vec<Param>,
}

impl Params {
    /// Project `event` according to `bindings`.
    pub fn project(event: &Event, bindings: &[ParamBinding]) -> Self {
        let values = bindings
            .iter()
            .map(|binding| match binding {
                ParamBinding::FullEvent => Param::Event(event.clone()),
                ParamBinding::Body => Param::Value(event.body().clone()),
                ParamBinding::Field(name) => Param::Value(field(event.body(), name)),
                ParamBinding::Header(name) => Param::Value(
                    event
                        .payload()
                        .header(name)
                        .map_or(Value::Null, |v| Value::String(v.to_string())),
                ),
                ParamBinding::Query(name) => Param::Value(
                    event
                        .payload()
                        .query(name)
                        .map_or(Value::Null, |v| Value::String(v.to_string())),
                ),
            })
            .collect();
        Self { values }
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no bindings were declared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The event at `index` (must be a [`ParamBinding::FullEvent`] slot).
    pub fn event(&self, index: usize) -> Result<Event, ExtractError> {
        match self.values.get(index) {
            Some(Param::Event(event)) => Ok(event.clone()),
            Some(Param::Value(_)) => Err(ExtractError::new(format!(
                "parameter {index} is a value, not the full event"
            ))),
            None => Err(missing(index)),
        }
    }

    /// The first full-event parameter, wherever it was declared.
    pub fn full_event(&self) -> Result<Event, ExtractError> {
        self.values
            .iter()
            .find_map(|p| match p {
                Param::Event(event) => Some(event.clone()),
                Param::Value(_) => None,
            })
            .ok_or_else(|| ExtractError::new("no full-event parameter was bound"))
    }

    /// The raw value at `index`.
    pub fn value(&self, index: usize) -> Result<&Value, ExtractError> {
        match self.values.get(index) {
            Some(Param::Value(value)) => Ok(value),
            Some(Param::Event(_)) => Err(ExtractError::new(format!(
                "parameter {index} is the full event, not a value"
            ))),
            None => Err(missing(index)),
        }
    }

    /// Deserialize the value at `index` into `T`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, ExtractError> {
        let value = self.value(index)?;
        serde_json::from_value(value.clone())
            .map_err(|e| ExtractError::new(format!("parameter {index}: {e}")))
    }
}

fn field(body: &Value, name: &str) -> Value {
    let found = if name.starts_with('/') {
        body.pointer(name)
    } else {
        body.get(name)
    };
    found.cloned().unwrap_or(Value::Null)
}

fn missing(index: usize) -> ExtractError {
    ExtractError::new(format!("no parameter bound at position {index}"))
}
