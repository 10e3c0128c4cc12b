//! Precondition checks used at the top of public operations.
//!
//! Every check names the offending parameter in its [`ValidationError`].
//!
//! The module is public so that custom [`Handler`](crate::strategy::Handler)
//! implementations and code that builds [`Behavior`](crate::wrapper::Behavior)
//! lists can report bad input with the same errors as the built-in
//! strategies. [`at_least_one`] and [`has_method`] belong to that surface:
//! the crate itself never has more than one candidate parameter, and it
//! reads callbacks through [`Callbacks`](crate::wrapper::Callbacks) rather
//! than by name.

use std::any::Any;
use std::fmt::{self, Display};

use serde_json::Value;

use crate::error::ValidationError;

pub type ValidationResult<T = ()> = std::result::Result<T, ValidationError>;

/// Primitive kinds of a JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values that can report which named callables they expose
pub trait Capabilities {
    fn exposes(&self, method: &str) -> bool;
}

/// At least one of the named parameters must be present.
pub fn at_least_one(parameters: &[(&str, bool)]) -> ValidationResult {
    if parameters.iter().any(|(_, present)| *present) {
        return Ok(());
    }
    Err(missing(parameters.iter().map(|(name, _)| *name)))
}

/// A single required parameter, returned when present.
pub fn required<'a, T>(parameter: &str, value: Option<&'a T>) -> ValidationResult<&'a T> {
    value.ok_or_else(|| missing([parameter]))
}

fn missing<'a>(parameters: impl IntoIterator<Item = &'a str>) -> ValidationError {
    ValidationError::MissingParameters {
        parameters: parameters.into_iter().map(str::to_string).collect(),
    }
}

pub fn non_empty(parameter: &str, value: &str) -> ValidationResult {
    if value.is_empty() {
        return Err(ValidationError::Empty {
            parameter: parameter.to_string(),
        });
    }
    Ok(())
}

pub fn is_type(parameter: &str, value: &Value, expected: ValueKind) -> ValidationResult {
    let actual = ValueKind::of(value);
    if actual != expected {
        return Err(ValidationError::WrongType {
            parameter: parameter.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Downcast a type-erased value, failing if it is not a `T`.
pub fn is_instance<'a, T: Any>(parameter: &str, value: &'a dyn Any) -> ValidationResult<&'a T> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| ValidationError::WrongInstance {
            parameter: parameter.to_string(),
            expected: short_type_name::<T>().to_string(),
        })
}

pub fn is_one_of<T: PartialEq + Display>(
    parameter: &str,
    value: &T,
    allowed: &[T],
) -> ValidationResult {
    if allowed.contains(value) {
        return Ok(());
    }
    Err(not_one_of(parameter, allowed))
}

/// Parse a name into the allowed value whose `Display` form equals it.
pub fn parse_one_of<T: Copy + Display>(parameter: &str, value: &str, allowed: &[T]) -> ValidationResult<T> {
    allowed
        .iter()
        .copied()
        .find(|candidate| candidate.to_string() == value)
        .ok_or_else(|| not_one_of(parameter, allowed))
}

fn not_one_of<T: Display>(parameter: &str, allowed: &[T]) -> ValidationError {
    ValidationError::NotOneOf {
        parameter: parameter.to_string(),
        allowed: allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
    }
}

pub fn has_method<T: Capabilities + ?Sized>(
    parameter: &str,
    value: &T,
    method: &str,
) -> ValidationResult {
    if value.exposes(method) {
        return Ok(());
    }
    Err(ValidationError::MissingMethod {
        parameter: parameter.to_string(),
        method: method.to_string(),
    })
}

pub fn is_value<T: PartialEq + Display>(parameter: &str, value: &T, expected: &T) -> ValidationResult {
    if value == expected {
        return Ok(());
    }
    Err(ValidationError::WrongValue {
        parameter: parameter.to_string(),
        expected: expected.to_string(),
        actual: value.to_string(),
    })
}

/// Detached cache updates need a Tokio runtime to be spawned on.
pub fn is_host_env() -> ValidationResult {
    tokio::runtime::Handle::try_current()
        .map(|_| ())
        .map_err(|_| ValidationError::WrongHostEnvironment {
            expected: "Tokio".to_string(),
        })
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
