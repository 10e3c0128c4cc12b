//! HTTP transport backed by `reqwest`.
//!
//! Understood fetch options:
//!
//! - `headers`: object of string values, applied over the request headers
//! - `timeout_ms`: per-request timeout in milliseconds

use std::time::Duration;

use async_trait::async_trait;
use runtime_caching_domain::{Headers, Method, Request, Response};

use super::{FetchOptions, Transport};
use crate::error::{TransportError, ValidationError};
use crate::validate::{self, ValidationResult, ValueKind};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("runtime-caching/{}", crate::VERSION),
        }
    }
}

/// Transport performing real HTTP requests
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(
        &self,
        request: &Request,
        options: &FetchOptions,
    ) -> Result<Response, TransportError> {
        let mut builder = self.client.request(to_reqwest_method(request.method), &request.url);

        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        let parsed = parse_options(options)
            .map_err(|e| TransportError::InvalidOptions(e.to_string()))?;
        for (name, value) in parsed.headers {
            builder = builder.header(name, value);
        }
        if let Some(timeout) = parsed.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string())))
            .collect();
        let body = response.bytes().await?;

        tracing::debug!(url = %url, status = status.as_u16(), "Network response");

        let mut result = Response::new(status.as_u16(), body.to_vec()).with_url(url);
        result.headers = headers;
        Ok(result)
    }

    fn check_options(&self, options: &FetchOptions) -> ValidationResult {
        parse_options(options).map(|_| ())
    }
}

/// The fetch options this transport understands
#[derive(Debug, Default)]
struct HttpOptions<'a> {
    headers: Vec<(&'a str, &'a str)>,
    timeout: Option<Duration>,
}

fn parse_options(options: &FetchOptions) -> ValidationResult<HttpOptions<'_>> {
    let mut parsed = HttpOptions::default();

    if let Some(headers) = options.get("headers") {
        validate::is_type("headers", headers, ValueKind::Object)?;
        for (name, value) in headers.as_object().into_iter().flatten() {
            validate::is_type(&format!("headers.{name}"), value, ValueKind::String)?;
            parsed.headers.push((name.as_str(), value.as_str().unwrap_or_default()));
        }
    }
    if let Some(timeout) = options.get("timeout_ms") {
        let millis = timeout.as_u64().ok_or_else(|| ValidationError::WrongType {
            parameter: "timeout_ms".to_string(),
            expected: "non-negative integer".to_string(),
            actual: ValueKind::of(timeout).to_string(),
        })?;
        parsed.timeout = Some(Duration::from_millis(millis));
    }
    Ok(parsed)
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}
