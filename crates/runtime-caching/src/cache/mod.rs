//! # Cache Module
//!
//! Cache store abstraction consumed by the [`RequestWrapper`](crate::RequestWrapper).
//!
//! A [`CacheStorage`] opens named, isolated [`Cache`]s. Each cache maps a
//! request to the last response stored for it (overwrite semantics). Two
//! stores are bundled:
//!
//! - [`MemoryCacheStorage`] - process-local, the default
//! - `RedisCacheStorage` - one Redis hash per cache (feature `redis`)

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_store;

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use runtime_caching_domain::{Method, Request, Response};

use crate::error::{StorageError, ValidationError};
use crate::validate::{self, ValidationResult, ValueKind};

pub use memory::{MemoryCache, MemoryCacheStorage};
#[cfg(feature = "redis")]
pub use redis_store::{RedisCache, RedisCacheStorage, RedisStoreConfig};

/// Options applied to every cache lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchOptions {
    /// Ignore the query string when comparing URLs. When several stored
    /// entries then match, the one with the lexicographically smallest URL
    /// is returned.
    #[serde(alias = "ignoreSearch")]
    pub ignore_search: bool,
    /// Allow non-GET requests to match
    #[serde(alias = "ignoreMethod")]
    pub ignore_method: bool,
    /// Skip `Vary` header comparison
    #[serde(alias = "ignoreVary")]
    pub ignore_vary: bool,
}

impl MatchOptions {
    /// Parse match options from a JSON object.
    pub fn from_value(value: &Value) -> ValidationResult<Self> {
        validate::is_type("match_options", value, ValueKind::Object)?;
        serde_json::from_value(value.clone()).map_err(|e| ValidationError::WrongType {
            parameter: "match_options".to_string(),
            expected: "object of boolean flags".to_string(),
            actual: e.to_string(),
        })
    }
}

/// What a cache keeps per key: the request (for `Vary` matching) and its response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub request: Request,
    pub response: Response,
}

/// Storage that hands out named caches
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open (creating if needed) the cache with the given name
    async fn open(&self, cache_name: &str) -> Result<Arc<dyn Cache>, StorageError>;
}

/// A single named cache
#[async_trait]
pub trait Cache: Send + Sync {
    /// Look up the stored response for a request
    async fn match_request(
        &self,
        request: &Request,
        options: &MatchOptions,
    ) -> Result<Option<Response>, StorageError>;

    /// Store a response for a request, replacing any previous entry
    async fn put(&self, request: &Request, response: &Response) -> Result<(), StorageError>;
}

pub type SharedCacheStorage = Arc<dyn CacheStorage>;

static DEFAULT_STORAGE: LazyLock<Arc<MemoryCacheStorage>> =
    LazyLock::new(|| Arc::new(MemoryCacheStorage::new()));

/// The process-wide storage used by wrappers built without an explicit one
pub fn default_storage() -> SharedCacheStorage {
    DEFAULT_STORAGE.clone()
}

// =============================================================================
// MATCHING
// =============================================================================

/// Cache key for a URL: the fragment is always dropped, the query only with
/// `ignore_search`.
pub fn cache_key(url: &str, ignore_search: bool) -> &str {
    let url = url.split_once('#').map_or(url, |(head, _)| head);
    if ignore_search {
        url.split_once('?').map_or(url, |(head, _)| head)
    } else {
        url
    }
}

/// Whether a stored entry answers `request` under `options`.
pub fn entry_matches(entry: &StoredEntry, request: &Request, options: &MatchOptions) -> bool {
    if !options.ignore_method && request.method != Method::Get {
        return false;
    }
    if cache_key(&entry.request.url, options.ignore_search)
        != cache_key(&request.url, options.ignore_search)
    {
        return false;
    }
    options.ignore_vary || vary_matches(entry, request)
}

fn vary_matches(entry: &StoredEntry, request: &Request) -> bool {
    let Some(vary) = entry.response.headers.get("vary") else {
        return true;
    };
    vary.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .all(|name| name != "*" && entry.request.headers.get(name) == request.headers.get(name))
}

/// Preconditions shared by every store's `put`.
pub fn check_put(request: &Request, response: &Response) -> Result<(), StorageError> {
    validate::is_value("request.method", &request.method, &Method::Get)?;
    let scheme = request.scheme().unwrap_or_default();
    validate::is_one_of("scheme", &scheme.as_str(), &["http", "https"])?;
    if response.is_error() {
        return Err(StorageError::UnstorableResponse(
            response.response_type.to_string(),
        ));
    }
    Ok(())
}
