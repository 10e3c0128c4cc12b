//! # Request Wrapper
//!
//! The only sanctioned path to the cache and the network. Strategies call
//! [`RequestWrapper::match_request`], [`RequestWrapper::fetch`] and
//! [`RequestWrapper::fetch_and_cache`]; the wrapper applies its cache name,
//! fetch/match options and lifecycle callbacks.
//!
//! ```text
//! fetch_and_cache(request)
//!   ├── request_will_fetch callbacks
//!   ├── transport.fetch ──(error)──> fetch_did_fail callbacks, return Err
//!   ├── cache_will_update callbacks (or is_ok)
//!   ├── spawn ─┬─ match old entry (non-opaque + cache_did_update registered)
//!   │          ├─ cache.put(clone)
//!   │          └─ cache_did_update callbacks
//!   └── return response (without waiting for the spawned task)
//! ```

pub mod behavior;

use std::sync::{Arc, LazyLock};

use serde_json::Value;
use tokio::sync::OnceCell;

use runtime_caching_domain::{Request, Response};

use crate::cache::{self, Cache, CacheStorage, MatchOptions, SharedCacheStorage};
use crate::config;
use crate::error::{Result, StorageError, TransportError};
use crate::network::{self, FetchOptions, SharedTransport};
use crate::validate;

pub use behavior::{
    Behavior, CacheDidUpdateFn, CacheUpdate, CacheWillUpdateFn, CallbackKind, Callbacks,
    FetchDidFailFn, RequestWillFetchFn,
};

/// Prefix of the default cache name
pub const DEFAULT_CACHE_PREFIX: &str = "runtime-caching";

static DEFAULT_CACHE_NAME: LazyLock<String> =
    LazyLock::new(|| cache_name_for_scope(&config::registration_scope()));

/// Cache name used when none is configured. Combines
/// [`DEFAULT_CACHE_PREFIX`] with the host's registration scope, so hosts
/// with different scopes on one origin get different caches.
pub fn default_cache_name() -> &'static str {
    &DEFAULT_CACHE_NAME
}

pub fn cache_name_for_scope(scope: &str) -> String {
    format!("{DEFAULT_CACHE_PREFIX}-{scope}")
}

/// Construction options, all optional
#[derive(Debug, Clone, Default)]
pub struct WrapperOptions {
    /// Cache namespace; `None` or empty selects [`default_cache_name`]
    pub cache_name: Option<String>,
    /// Behaviors whose callbacks are registered, in order
    pub behaviors: Vec<Behavior>,
    /// JSON object passed through to the transport on every fetch
    pub fetch_options: Option<Value>,
    /// JSON object parsed into [`MatchOptions`]
    pub match_options: Option<Value>,
}

/// Mediates cache reads, cache writes and network fetches.
///
/// Immutable after construction and safe to share across concurrent
/// requests behind an `Arc`.
pub struct RequestWrapper {
    cache_name: Arc<str>,
    fetch_options: FetchOptions,
    match_options: MatchOptions,
    callbacks: Arc<Callbacks>,
    storage: SharedCacheStorage,
    transport: SharedTransport,
    cache: Arc<OnceCell<Arc<dyn Cache>>>,
}

impl RequestWrapper {
    /// Build a wrapper over explicit storage and transport.
    ///
    /// # Errors
    ///
    /// Returns a validation error for options that are not JSON objects or
    /// that the transport cannot honor. An empty cache name counts as
    /// absent and selects [`default_cache_name`].
    pub fn new(
        options: WrapperOptions,
        storage: SharedCacheStorage,
        transport: SharedTransport,
    ) -> Result<Self> {
        let cache_name = match options.cache_name {
            Some(name) if !name.is_empty() => name,
            _ => default_cache_name().to_string(),
        };
        let fetch_options = options
            .fetch_options
            .as_ref()
            .map(FetchOptions::from_value)
            .transpose()?
            .unwrap_or_default();
        let match_options = options
            .match_options
            .as_ref()
            .map(MatchOptions::from_value)
            .transpose()?
            .unwrap_or_default();
        transport.check_options(&fetch_options)?;

        Ok(Self {
            cache_name: Arc::from(cache_name),
            fetch_options,
            match_options,
            callbacks: Arc::new(Callbacks::from_behaviors(&options.behaviors)),
            storage,
            transport,
            cache: Arc::new(OnceCell::new()),
        })
    }

    /// Build a wrapper over the process-wide default storage and transport.
    ///
    /// # Errors
    ///
    /// Same as [`RequestWrapper::new`].
    pub fn with_options(options: WrapperOptions) -> Result<Self> {
        Self::new(options, cache::default_storage(), network::default_transport())
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub fn fetch_options(&self) -> &FetchOptions {
        &self.fetch_options
    }

    pub fn match_options(&self) -> MatchOptions {
        self.match_options
    }

    /// The cache for this wrapper, opened on first use.
    pub async fn get_cache(&self) -> Result<Arc<dyn Cache>> {
        Ok(open_cache(&self.cache, self.storage.as_ref(), &self.cache_name).await?)
    }

    /// Look up `request` in this wrapper's cache.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>> {
        let cache = self.get_cache().await?;
        let found = cache.match_request(request, &self.match_options).await?;

        if found.is_some() {
            tracing::debug!(cache_name = %self.cache_name, url = %request.url, "Cache hit");
        } else {
            tracing::debug!(cache_name = %self.cache_name, url = %request.url, "Cache miss");
        }
        Ok(found)
    }

    /// Fetch `request` from the network.
    ///
    /// On a network failure every `fetch_did_fail` callback receives the
    /// original request before the error is returned. Rejected options are
    /// not a network failure and fire no callbacks.
    pub async fn fetch(&self, request: &Request) -> Result<Response> {
        let outgoing = self.callbacks.request_will_fetch(request.clone());

        match self.transport.fetch(&outgoing, &self.fetch_options).await {
            Ok(response) => Ok(response),
            Err(e @ TransportError::InvalidOptions(_)) => Err(e.into()),
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "Network request failed");
                self.callbacks.fetch_did_fail(request);
                Err(e.into())
            }
        }
    }

    /// Fetch `request` and, if cacheable, write a clone of the response to
    /// the cache in a detached task. The response is returned without
    /// waiting for the write; write failures are only logged.
    pub async fn fetch_and_cache(&self, request: &Request) -> Result<Response> {
        validate::is_host_env()?;

        let response = self.fetch(request).await?;

        if !self.callbacks.cache_will_update(&response) {
            tracing::debug!(
                cache_name = %self.cache_name,
                url = %request.url,
                status = response.status,
                "Response not cacheable"
            );
            return Ok(response);
        }

        let update = CacheUpdateTask {
            cache_name: Arc::clone(&self.cache_name),
            cache: Arc::clone(&self.cache),
            storage: Arc::clone(&self.storage),
            callbacks: Arc::clone(&self.callbacks),
            match_options: self.match_options,
            request: request.clone(),
            response: response.clone(),
        };
        tokio::spawn(async move {
            let cache_name = Arc::clone(&update.cache_name);
            let url = update.request.url.clone();
            if let Err(e) = update.run().await {
                tracing::warn!(
                    cache_name = %cache_name,
                    url = %url,
                    error = %e,
                    "Background cache update failed"
                );
            }
        });

        Ok(response)
    }
}

impl Default for RequestWrapper {
    fn default() -> Self {
        Self {
            cache_name: Arc::from(default_cache_name()),
            fetch_options: FetchOptions::default(),
            match_options: MatchOptions::default(),
            callbacks: Arc::new(Callbacks::default()),
            storage: cache::default_storage(),
            transport: network::default_transport(),
            cache: Arc::new(OnceCell::new()),
        }
    }
}

impl std::fmt::Debug for RequestWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestWrapper")
            .field("cache_name", &self.cache_name)
            .field("fetch_options", &self.fetch_options)
            .field("match_options", &self.match_options)
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

async fn open_cache(
    cell: &OnceCell<Arc<dyn Cache>>,
    storage: &dyn CacheStorage,
    cache_name: &str,
) -> std::result::Result<Arc<dyn Cache>, StorageError> {
    cell.get_or_try_init(|| storage.open(cache_name))
        .await
        .map(Arc::clone)
}

/// Everything the detached cache update needs, owned
struct CacheUpdateTask {
    cache_name: Arc<str>,
    cache: Arc<OnceCell<Arc<dyn Cache>>>,
    storage: SharedCacheStorage,
    callbacks: Arc<Callbacks>,
    match_options: MatchOptions,
    request: Request,
    response: Response,
}

impl CacheUpdateTask {
    async fn run(self) -> std::result::Result<(), StorageError> {
        let cache = open_cache(&self.cache, self.storage.as_ref(), &self.cache_name).await?;
        let notify = self.callbacks.has(CallbackKind::CacheDidUpdate);

        // An opaque response tells the callbacks nothing, so skip the read.
        let old_response = if notify && !self.response.is_opaque() {
            cache.match_request(&self.request, &self.match_options).await?
        } else {
            None
        };

        cache.put(&self.request, &self.response).await?;
        tracing::debug!(cache_name = %self.cache_name, url = %self.request.url, "Cache updated");

        if notify {
            self.callbacks.cache_did_update(&CacheUpdate {
                cache_name: &self.cache_name,
                old_response: old_response.as_ref(),
                new_response: &self.response,
            });
        }
        Ok(())
    }
}
