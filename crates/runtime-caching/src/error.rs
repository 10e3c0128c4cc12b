//! Runtime caching error types

use thiserror::Error;

/// Precondition violations raised by the [`validate`](crate::validate) helpers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please set at least one of the following parameters: {}", quoted(.parameters))]
    MissingParameters { parameters: Vec<String> },

    #[error("The '{parameter}' parameter has the wrong type. (Expected: {expected}, actual: {actual})")]
    WrongType {
        parameter: String,
        expected: String,
        actual: String,
    },

    #[error("The '{parameter}' parameter must be an instance of '{expected}'")]
    WrongInstance { parameter: String, expected: String },

    #[error("The '{parameter}' parameter must be set to one of the following: {allowed}")]
    NotOneOf { parameter: String, allowed: String },

    #[error("The '{parameter}' parameter must be an object that exposes a '{method}' method.")]
    MissingMethod { parameter: String, method: String },

    #[error("The '{parameter}' parameter has the wrong value. (Expected: {expected}, actual: {actual})")]
    WrongValue {
        parameter: String,
        expected: String,
        actual: String,
    },

    #[error("This code must run inside a {expected} runtime")]
    WrongHostEnvironment { expected: String },

    #[error("The '{parameter}' parameter must not be empty")]
    Empty { parameter: String },
}

fn quoted(parameters: &[String]) -> String {
    parameters
        .iter()
        .map(|p| format!("'{p}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Network transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid fetch options: {0}")]
    InvalidOptions(String),

    #[error("No network transport is available")]
    Unavailable,
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Cache store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cannot store {0} response")]
    UnstorableResponse(String),

    #[error("The '{0}' store is not enabled in this build")]
    Unsupported(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        Self::Redis(err.to_string())
    }
}

/// Top-level error for wrapper and strategy operations
#[derive(Debug, Error)]
pub enum RuntimeCachingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    #[error("Cache storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("This abstract method must be implemented by a concrete strategy")]
    NotImplemented,
}

pub type Result<T> = std::result::Result<T, RuntimeCachingError>;
