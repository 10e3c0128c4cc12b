//! # Redis Cache Storage
//!
//! Each named cache is one Redis hash, `{key_prefix}:{cache_name}`. Fields are
//! request URLs without fragment; values are JSON-encoded [`StoredEntry`]s.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use runtime_caching_domain::{Method, Request, Response};

use super::{Cache, CacheStorage, MatchOptions, StoredEntry, cache_key, check_put, entry_matches};
use crate::error::StorageError;
use crate::validate;

/// Redis store configuration
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    pub url: String,
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "runtime-caching".to_string(),
        }
    }
}

/// Redis-backed cache storage sharing one managed connection
#[derive(Clone)]
pub struct RedisCacheStorage {
    conn: ConnectionManager,
    config: RedisStoreConfig,
}

impl RedisCacheStorage {
    /// Connect to Redis. The key prefix must be non-empty.
    pub async fn new(config: RedisStoreConfig) -> Result<Self, StorageError> {
        validate::non_empty("key_prefix", &config.key_prefix)?;
        let client = Client::open(config.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        tracing::debug!(url = %config.url, prefix = %config.key_prefix, "Redis cache storage connected");
        Ok(Self { conn, config })
    }

    pub fn config(&self) -> &RedisStoreConfig {
        &self.config
    }
}

#[async_trait]
impl CacheStorage for RedisCacheStorage {
    async fn open(&self, cache_name: &str) -> Result<Arc<dyn Cache>, StorageError> {
        Ok(Arc::new(RedisCache {
            conn: self.conn.clone(),
            key: hash_key(&self.config.key_prefix, cache_name),
        }))
    }
}

/// One named cache stored as a Redis hash
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    key: String,
}

impl RedisCache {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn match_request(
        &self,
        request: &Request,
        options: &MatchOptions,
    ) -> Result<Option<Response>, StorageError> {
        if !options.ignore_method && request.method != Method::Get {
            return Ok(None);
        }
        let mut conn = self.conn.clone();

        if !options.ignore_search {
            let value: Option<String> = conn.hget(&self.key, cache_key(&request.url, false)).await?;
            return match value {
                Some(json) => {
                    let entry: StoredEntry = serde_json::from_str(&json)?;
                    Ok(entry_matches(&entry, request, options).then_some(entry.response))
                }
                None => Ok(None),
            };
        }

        // Scan in field order so the smallest matching URL wins, as in memory.
        let all: BTreeMap<String, String> = conn.hgetall(&self.key).await?;
        for json in all.values() {
            let entry: StoredEntry = serde_json::from_str(json)?;
            if entry_matches(&entry, request, options) {
                return Ok(Some(entry.response));
            }
        }
        Ok(None)
    }

    async fn put(&self, request: &Request, response: &Response) -> Result<(), StorageError> {
        check_put(request, response)?;

        let entry = StoredEntry {
            request: request.clone(),
            response: response.clone(),
        };
        let json = serde_json::to_string(&entry)?;
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(&self.key, cache_key(&request.url, false), json)
            .await?;
        Ok(())
    }
}

fn hash_key(prefix: &str, cache_name: &str) -> String {
    format!("{prefix}:{cache_name}")
}
