//! # Network Module
//!
//! Transport abstraction used by [`RequestWrapper::fetch`](crate::RequestWrapper::fetch).

#[cfg(feature = "http")]
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use runtime_caching_domain::{Request, Response};

use crate::error::TransportError;
use crate::validate::{self, ValidationResult, ValueKind};

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpTransport};

/// Opaque options passed along to every fetch made by a wrapper.
///
/// The wrapper never interprets them; each transport decides which keys it
/// understands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions(Map<String, Value>);

impl FetchOptions {
    /// Build options from a JSON object.
    pub fn from_value(value: &Value) -> ValidationResult<Self> {
        validate::is_type("fetch_options", value, ValueKind::Object)?;
        Ok(Self(value.as_object().cloned().unwrap_or_default()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Network transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a network request. Fails on network-level errors only; HTTP
    /// error statuses are regular responses.
    async fn fetch(&self, request: &Request, options: &FetchOptions)
    -> Result<Response, TransportError>;

    /// Reject fetch options this transport cannot honor. Called once, when a
    /// wrapper is built.
    fn check_options(&self, _options: &FetchOptions) -> ValidationResult {
        Ok(())
    }
}

pub type SharedTransport = Arc<dyn Transport>;

/// Transport that fails every request
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableTransport;

#[async_trait]
impl Transport for UnavailableTransport {
    async fn fetch(
        &self,
        _request: &Request,
        _options: &FetchOptions,
    ) -> Result<Response, TransportError> {
        Err(TransportError::Unavailable)
    }
}

/// Transport used by wrappers built without an explicit one
pub fn default_transport() -> SharedTransport {
    #[cfg(feature = "http")]
    {
        match HttpTransport::new(&HttpConfig::default()) {
            Ok(transport) => return Arc::new(transport),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build HTTP transport, network disabled");
            }
        }
    }
    Arc::new(UnavailableTransport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fetch_options_require_object() {
        let options = FetchOptions::from_value(&json!({ "timeout_ms": 500 })).unwrap();
        assert_eq!(options.get("timeout_ms"), Some(&json!(500)));

        assert!(FetchOptions::from_value(&json!(500)).is_err());
        assert!(FetchOptions::default().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_transport_fails() {
        let result = UnavailableTransport
            .fetch(&Request::get("https://a.test/"), &FetchOptions::default())
            .await;
        assert!(matches!(result, Err(TransportError::Unavailable)));
    }
}
