//! # Runtime Caching - Domain Model
//!
//! Core request/response types exchanged between the caching strategies,
//! the cache stores and the network transport. These types are the single
//! source of truth across all layers: strategies, stores and transports.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::string::FromUtf8Error;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ENUMS
// =============================================================================

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a method name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown HTTP method: {0}")]
pub struct ParseMethodError(pub String);

impl FromStr for Method {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(ParseMethodError(s.to_string())),
        }
    }
}

/// Response type, as seen by the intercepting handler.
///
/// `Opaque` responses come from cross-origin requests whose status and body
/// cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Basic,
    Cors,
    Default,
    Error,
    Opaque,
    OpaqueRedirect,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Default => "default",
            Self::Error => "error",
            Self::Opaque => "opaque",
            Self::OpaqueRedirect => "opaqueredirect",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Case-insensitive header map. Names are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Insert a header, returning the previous value if any
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// An intercepted request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// URL scheme, lowercased (`https` for `https://host/a`)
    pub fn scheme(&self) -> Option<String> {
        self.url
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
    }
}

/// A response from the network or the cache.
///
/// The body can only be taken out by value, so a response is consumed at
/// most once. Callers that need to both store and return a response must
/// `clone()` it first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub url: String,
    pub response_type: ResponseType,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            headers: Headers::new(),
            url: String::new(),
            response_type: ResponseType::Basic,
            body: body.into(),
        }
    }

    /// A `200 OK` response with the given body
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// The generic network error response: status 0, type `error`, no body
    pub fn error() -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: Headers::new(),
            url: String::new(),
            response_type: ResponseType::Error,
            body: Vec::new(),
        }
    }

    /// An opaque cross-origin response: status 0, unreadable body
    pub fn opaque() -> Self {
        Self {
            response_type: ResponseType::Opaque,
            ..Self::error()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// True for 2xx statuses
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn is_opaque(&self) -> bool {
        self.response_type == ResponseType::Opaque
    }

    pub fn is_error(&self) -> bool {
        self.response_type == ResponseType::Error
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Consume the response and decode the body as UTF-8
    pub fn text(self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.body)
    }
}

fn reason_phrase(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or_default()
}

/// The event that triggered the intercepting handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchEvent {
    pub request: Request,
    pub client_id: Option<String>,
}

impl FetchEvent {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            client_id: None,
        }
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;
    use fake::faker::lorem::en::Word;

    #[test]
    fn test_ok_range() {
        assert!(Response::new(200, "").is_ok());
        assert!(Response::new(299, "").is_ok());
        assert!(!Response::new(304, "").is_ok());
        assert!(!Response::new(199, "").is_ok());
        assert!(!Response::opaque().is_ok());
    }

    #[test]
    fn test_status_text_from_status() {
        assert_eq!(Response::ok("x").status_text, "OK");
        assert_eq!(Response::new(418, "").status_text, "I'm a teapot");
        assert_eq!(Response::new(299, "").status_text, "");
    }

    #[test]
    fn test_error_and_opaque_responses() {
        let error = Response::error();
        assert_eq!(error.status, 0);
        assert!(error.is_error());
        assert!(error.body().is_empty());

        let opaque = Response::opaque();
        assert!(opaque.is_opaque());
        assert!(!opaque.is_error());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let request = Request::get("https://example.com/").with_header("Accept-Language", "en");

        assert_eq!(request.headers.get("accept-language"), Some("en"));
        assert_eq!(request.headers.get("ACCEPT-LANGUAGE"), Some("en"));
        assert!(request.headers.contains("Accept-language"));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<Method>(), Ok(Method::Get));
        assert_eq!("DELETE".parse::<Method>(), Ok(Method::Delete));
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn test_scheme() {
        let path: String = Word().fake();
        let request = Request::get(format!("HTTPS://example.com/{path}"));
        assert_eq!(request.scheme().as_deref(), Some("https"));
        assert_eq!(Request::get("/relative").scheme(), None);
    }

    #[test]
    fn test_clone_keeps_body() {
        let response = Response::ok("hello").with_header("Content-Type", "text/plain");
        let stored = response.clone();

        assert_eq!(response.text().unwrap(), "hello");
        assert_eq!(stored.headers.get("content-type"), Some("text/plain"));
        assert_eq!(stored.into_body(), b"hello");
    }

    #[test]
    fn test_response_type_serialization() {
        let json = serde_json::to_string(&ResponseType::OpaqueRedirect).unwrap();
        assert_eq!(json, "\"opaqueredirect\"");
    }
}
