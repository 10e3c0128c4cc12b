//! # Runtime Caching Configuration
//!
//! Environment-based configuration for assembling a strategy.
//!
//! | Variable | Default |
//! |---|---|
//! | `RUNTIME_CACHING_SCOPE` | `http://localhost/` |
//! | `RUNTIME_CACHING_CACHE_NAME` | derived from the scope |
//! | `RUNTIME_CACHING_STRATEGY` | `network-first` |
//! | `RUNTIME_CACHING_STORE` | `memory` |
//! | `REDIS_URL` | `redis://127.0.0.1:6379` |
//! | `RUNTIME_CACHING_REDIS_PREFIX` | `runtime-caching` |
//! | `RUNTIME_CACHING_HTTP_TIMEOUT_MS` | `30000` |
//! | `RUNTIME_CACHING_USER_AGENT` | `runtime-caching/{version}` |

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{self, SharedCacheStorage};
use crate::error::{StorageError, TransportError, ValidationError};
use crate::network::SharedTransport;
use crate::strategy::StrategyKind;
use crate::validate;
use crate::wrapper;

pub const DEFAULT_SCOPE: &str = "http://localhost/";

/// The host's registration scope, from `RUNTIME_CACHING_SCOPE`
pub fn registration_scope() -> String {
    env::var("RUNTIME_CACHING_SCOPE").unwrap_or_else(|_| DEFAULT_SCOPE.to_string())
}

/// Where cached entries live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Memory,
    Redis,
}

impl StoreBackend {
    pub const ALL: [Self; 2] = [Self::Memory, Self::Redis];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate::parse_one_of("store", s, &Self::ALL)
    }
}

/// Runtime caching configuration
#[derive(Debug, Clone)]
pub struct CachingConfig {
    /// Registration scope, part of the default cache name
    pub scope: String,

    /// Explicit cache name, overriding the scope-derived default
    pub cache_name: Option<String>,

    /// Strategy built by [`crate::init`]
    pub strategy: StrategyKind,

    /// Cache store backend
    pub store: StoreBackend,

    /// Redis URL, used by the `redis` store
    pub redis_url: String,

    /// Redis key prefix, used by the `redis` store
    pub redis_prefix: String,

    /// HTTP client timeout
    pub http_timeout: Duration,

    /// HTTP user agent
    pub user_agent: String,
}

impl CachingConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Fails when the strategy or store name is not recognized.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            scope: var("RUNTIME_CACHING_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),

            cache_name: var("RUNTIME_CACHING_CACHE_NAME"),

            strategy: var("RUNTIME_CACHING_STRATEGY")
                .map(|v| v.parse::<StrategyKind>())
                .transpose()?
                .unwrap_or_default(),

            store: var("RUNTIME_CACHING_STORE")
                .map(|v| v.parse::<StoreBackend>())
                .transpose()?
                .unwrap_or_default(),

            redis_url: var("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),

            redis_prefix: var("RUNTIME_CACHING_REDIS_PREFIX")
                .unwrap_or_else(|| wrapper::DEFAULT_CACHE_PREFIX.to_string()),

            http_timeout: var("RUNTIME_CACHING_HTTP_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .map_or(Duration::from_secs(30), Duration::from_millis),

            user_agent: var("RUNTIME_CACHING_USER_AGENT")
                .unwrap_or_else(|| format!("runtime-caching/{}", crate::VERSION)),
        })
    }

    /// The configured cache name, or the default for this scope when unset
    /// or empty
    pub fn resolved_cache_name(&self) -> String {
        self.cache_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| wrapper::cache_name_for_scope(&self.scope))
    }

    /// Open the configured cache store.
    pub async fn build_storage(&self) -> Result<SharedCacheStorage, StorageError> {
        match self.store {
            StoreBackend::Memory => Ok(cache::default_storage()),
            #[cfg(feature = "redis")]
            StoreBackend::Redis => {
                let storage = cache::RedisCacheStorage::new(cache::RedisStoreConfig {
                    url: self.redis_url.clone(),
                    key_prefix: self.redis_prefix.clone(),
                })
                .await?;
                Ok(Arc::new(storage))
            }
            #[cfg(not(feature = "redis"))]
            StoreBackend::Redis => Err(StorageError::Unsupported(self.store.to_string())),
        }
    }

    /// Build the network transport.
    pub fn build_transport(&self) -> Result<SharedTransport, TransportError> {
        #[cfg(feature = "http")]
        {
            let transport = crate::network::HttpTransport::new(&crate::network::HttpConfig {
                timeout: self.http_timeout,
                user_agent: self.user_agent.clone(),
            })?;
            Ok(Arc::new(transport))
        }
        #[cfg(not(feature = "http"))]
        {
            tracing::warn!("Built without the `http` feature, network disabled");
            Ok(Arc::new(crate::network::UnavailableTransport))
        }
    }
}

impl Default for CachingConfig {
    fn default() -> Self {
        Self {
            scope: DEFAULT_SCOPE.to_string(),
            cache_name: None,
            strategy: StrategyKind::default(),
            store: StoreBackend::default(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            redis_prefix: wrapper::DEFAULT_CACHE_PREFIX.to_string(),
            http_timeout: Duration::from_secs(30),
            user_agent: format!("runtime-caching/{}", crate::VERSION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CachingConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.scope, DEFAULT_SCOPE);
        assert_eq!(config.strategy, StrategyKind::NetworkFirst);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.redis_prefix, "runtime-caching");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.resolved_cache_name(), "runtime-caching-http://localhost/");
    }

    #[test]
    fn test_overrides() {
        let config = CachingConfig::from_lookup(lookup(&[
            ("RUNTIME_CACHING_SCOPE", "https://app.test/"),
            ("RUNTIME_CACHING_STRATEGY", "stale-while-revalidate"),
            ("RUNTIME_CACHING_STORE", "redis"),
            ("RUNTIME_CACHING_HTTP_TIMEOUT_MS", "1500"),
        ]))
        .unwrap();

        assert_eq!(config.strategy, StrategyKind::StaleWhileRevalidate);
        assert_eq!(config.store, StoreBackend::Redis);
        assert_eq!(config.http_timeout, Duration::from_millis(1500));
        assert_eq!(config.resolved_cache_name(), "runtime-caching-https://app.test/");

        let named = CachingConfig::from_lookup(lookup(&[("RUNTIME_CACHING_CACHE_NAME", "static")]))
            .unwrap();
        assert_eq!(named.resolved_cache_name(), "static");

        let blank = CachingConfig::from_lookup(lookup(&[
            ("RUNTIME_CACHING_SCOPE", "https://app.test/"),
            ("RUNTIME_CACHING_CACHE_NAME", ""),
        ]))
        .unwrap();
        assert_eq!(blank.resolved_cache_name(), "runtime-caching-https://app.test/");
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        let err = CachingConfig::from_lookup(lookup(&[("RUNTIME_CACHING_STORE", "disk")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The 'store' parameter must be set to one of the following: memory,redis"
        );

        assert!(CachingConfig::from_lookup(lookup(&[("RUNTIME_CACHING_STRATEGY", "fastest")])).is_err());
    }

    #[tokio::test]
    async fn test_memory_store_is_process_wide() {
        let config = CachingConfig::default();
        let a = config.build_storage().await.unwrap();
        let b = config.build_storage().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
