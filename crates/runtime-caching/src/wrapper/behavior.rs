//! Lifecycle callbacks fired by the [`RequestWrapper`](super::RequestWrapper).
//!
//! A [`Behavior`] bundles zero or more typed callbacks. The wrapper folds an
//! ordered list of behaviors into [`Callbacks`], four ordered lists that are
//! never modified afterwards.

use std::fmt;
use std::sync::Arc;

use runtime_caching_domain::{Request, Response};

use crate::validate::Capabilities;

/// Payload handed to every `cache_did_update` callback
#[derive(Debug, Clone, Copy)]
pub struct CacheUpdate<'a> {
    pub cache_name: &'a str,
    /// Previous entry. Only looked up for non-opaque responses.
    pub old_response: Option<&'a Response>,
    pub new_response: &'a Response,
}

pub type CacheDidUpdateFn = Arc<dyn Fn(&CacheUpdate<'_>) -> anyhow::Result<()> + Send + Sync>;
pub type CacheWillUpdateFn = Arc<dyn Fn(&Response) -> bool + Send + Sync>;
pub type FetchDidFailFn = Arc<dyn Fn(&Request) + Send + Sync>;
pub type RequestWillFetchFn = Arc<dyn Fn(Request) -> Request + Send + Sync>;

/// The lifecycle hooks a behavior can implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    /// After a response was written to the cache
    CacheDidUpdate,
    /// Before a network response is written; decides cacheability
    CacheWillUpdate,
    /// After a network request failed
    FetchDidFail,
    /// Before a network request is made; may rewrite it
    RequestWillFetch,
}

impl CallbackKind {
    pub const ALL: [Self; 4] = [
        Self::CacheDidUpdate,
        Self::CacheWillUpdate,
        Self::FetchDidFail,
        Self::RequestWillFetch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheDidUpdate => "cache_did_update",
            Self::CacheWillUpdate => "cache_will_update",
            Self::FetchDidFail => "fetch_did_fail",
            Self::RequestWillFetch => "request_will_fetch",
        }
    }
}

/// A caller-supplied bundle of lifecycle callbacks
#[derive(Clone, Default)]
pub struct Behavior {
    cache_did_update: Option<CacheDidUpdateFn>,
    cache_will_update: Option<CacheWillUpdateFn>,
    fetch_did_fail: Option<FetchDidFailFn>,
    request_will_fetch: Option<RequestWillFetchFn>,
}

impl Behavior {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_cache_did_update<F>(mut self, callback: F) -> Self
    where
        F: Fn(&CacheUpdate<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.cache_did_update = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_cache_will_update<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Response) -> bool + Send + Sync + 'static,
    {
        self.cache_will_update = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_fetch_did_fail<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        self.fetch_did_fail = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_request_will_fetch<F>(mut self, callback: F) -> Self
    where
        F: Fn(Request) -> Request + Send + Sync + 'static,
    {
        self.request_will_fetch = Some(Arc::new(callback));
        self
    }

    pub fn implements(&self, kind: CallbackKind) -> bool {
        match kind {
            CallbackKind::CacheDidUpdate => self.cache_did_update.is_some(),
            CallbackKind::CacheWillUpdate => self.cache_will_update.is_some(),
            CallbackKind::FetchDidFail => self.fetch_did_fail.is_some(),
            CallbackKind::RequestWillFetch => self.request_will_fetch.is_some(),
        }
    }
}

impl Capabilities for Behavior {
    fn exposes(&self, method: &str) -> bool {
        CallbackKind::ALL
            .iter()
            .any(|kind| kind.as_str() == method && self.implements(*kind))
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<&str> = CallbackKind::ALL
            .iter()
            .filter(|kind| self.implements(**kind))
            .map(CallbackKind::as_str)
            .collect();
        f.debug_struct("Behavior").field("callbacks", &kinds).finish()
    }
}

/// The wrapper's callback set, in behavior registration order
#[derive(Clone, Default)]
pub struct Callbacks {
    cache_did_update: Vec<CacheDidUpdateFn>,
    cache_will_update: Vec<CacheWillUpdateFn>,
    fetch_did_fail: Vec<FetchDidFailFn>,
    request_will_fetch: Vec<RequestWillFetchFn>,
}

impl Callbacks {
    pub fn from_behaviors(behaviors: &[Behavior]) -> Self {
        let mut callbacks = Self::default();
        for behavior in behaviors {
            callbacks
                .cache_did_update
                .extend(behavior.cache_did_update.clone());
            callbacks
                .cache_will_update
                .extend(behavior.cache_will_update.clone());
            callbacks.fetch_did_fail.extend(behavior.fetch_did_fail.clone());
            callbacks
                .request_will_fetch
                .extend(behavior.request_will_fetch.clone());
        }
        callbacks
    }

    /// Number of registered callbacks of a kind
    pub fn count(&self, kind: CallbackKind) -> usize {
        match kind {
            CallbackKind::CacheDidUpdate => self.cache_did_update.len(),
            CallbackKind::CacheWillUpdate => self.cache_will_update.len(),
            CallbackKind::FetchDidFail => self.fetch_did_fail.len(),
            CallbackKind::RequestWillFetch => self.request_will_fetch.len(),
        }
    }

    pub fn has(&self, kind: CallbackKind) -> bool {
        self.count(kind) > 0
    }

    /// Thread the outgoing request through every `request_will_fetch` callback.
    pub(crate) fn request_will_fetch(&self, request: Request) -> Request {
        self.request_will_fetch
            .iter()
            .fold(request, |request, callback| callback(request))
    }

    pub(crate) fn fetch_did_fail(&self, request: &Request) {
        for callback in &self.fetch_did_fail {
            callback(request);
        }
    }

    /// Cacheability of a network response.
    ///
    /// Defaults to `is_ok()`. Registered callbacks replace the default: the
    /// result is the OR of all of them, and each one runs even after another
    /// returned `true`.
    pub(crate) fn cache_will_update(&self, response: &Response) -> bool {
        if self.cache_will_update.is_empty() {
            return response.is_ok();
        }
        self.cache_will_update
            .iter()
            .fold(false, |cacheable, callback| callback(response) || cacheable)
    }

    /// Run every `cache_did_update` callback; failures are logged, not returned.
    pub(crate) fn cache_did_update(&self, update: &CacheUpdate<'_>) {
        for callback in &self.cache_did_update {
            if let Err(e) = callback(update) {
                tracing::warn!(
                    cache_name = %update.cache_name,
                    error = %e,
                    "cache_did_update callback failed"
                );
            }
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("cache_did_update", &self.cache_did_update.len())
            .field("cache_will_update", &self.cache_will_update.len())
            .field("fetch_did_fail", &self.fetch_did_fail.len())
            .field("request_will_fetch", &self.request_will_fetch.len())
            .finish()
    }
}
