//! In-memory cache storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use runtime_caching_domain::{Request, Response};

use super::{Cache, CacheStorage, MatchOptions, StoredEntry, cache_key, check_put, entry_matches};
use crate::error::StorageError;

/// Process-local storage of named caches
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<HashMap<String, Arc<MemoryCache>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the cache with the given name
    pub async fn cache(&self, cache_name: &str) -> Arc<MemoryCache> {
        if let Some(cache) = self.caches.read().await.get(cache_name) {
            return Arc::clone(cache);
        }
        let mut caches = self.caches.write().await;
        Arc::clone(caches.entry(cache_name.to_string()).or_default())
    }

    pub async fn has(&self, cache_name: &str) -> bool {
        self.caches.read().await.contains_key(cache_name)
    }

    /// Names of every cache opened so far
    pub async fn keys(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, cache_name: &str) -> Result<Arc<dyn Cache>, StorageError> {
        let cache: Arc<dyn Cache> = self.cache(cache_name).await;
        Ok(cache)
    }
}

/// A single in-memory cache, keyed by URL without fragment
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryCache {
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Stored request URLs, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.entries.read().await.keys().cloned().collect();
        urls.sort();
        urls
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn match_request(
        &self,
        request: &Request,
        options: &MatchOptions,
    ) -> Result<Option<Response>, StorageError> {
        let entries = self.entries.read().await;

        if !options.ignore_search {
            let found = entries
                .get(cache_key(&request.url, false))
                .filter(|entry| entry_matches(entry, request, options))
                .map(|entry| entry.response.clone());
            return Ok(found);
        }

        // Several stored URLs can share a path; the smallest one wins.
        Ok(entries
            .iter()
            .filter(|(_, entry)| entry_matches(entry, request, options))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, entry)| entry.response.clone()))
    }

    async fn put(&self, request: &Request, response: &Response) -> Result<(), StorageError> {
        check_put(request, response)?;

        let entry = StoredEntry {
            request: request.clone(),
            response: response.clone(),
        };
        self.entries
            .write()
            .await
            .insert(cache_key(&request.url, false).to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;
    use fake::faker::lorem::en::Word;
    use runtime_caching_domain::Method;

    fn url() -> String {
        let segment: String = Word().fake();
        format!("https://example.test/{segment}.json")
    }

    #[tokio::test]
    async fn test_open_is_memoized_per_name() {
        let storage = MemoryCacheStorage::new();
        let first = storage.cache("static").await;
        let second = storage.cache("static").await;
        let other = storage.cache("api").await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(storage.keys().await, vec!["api", "static"]);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let storage = MemoryCacheStorage::new();
        let request = Request::get(url());

        storage
            .open("a")
            .await
            .unwrap()
            .put(&request, &Response::ok("a"))
            .await
            .unwrap();

        let other = storage.open("b").await.unwrap();
        let found = other
            .match_request(&request, &MatchOptions::default())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = MemoryCache::default();
        let request = Request::get(url());

        cache.put(&request, &Response::ok("old")).await.unwrap();
        cache.put(&request, &Response::ok("new")).await.unwrap();

        let found = cache
            .match_request(&request, &MatchOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.text().unwrap(), "new");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_ignore_search_scans_entries() {
        let cache = MemoryCache::default();
        let base = url();
        cache
            .put(&Request::get(format!("{base}?v=1")), &Response::ok("v1"))
            .await
            .unwrap();

        let query = Request::get(format!("{base}?v=2"));
        assert!(
            cache
                .match_request(&query, &MatchOptions::default())
                .await
                .unwrap()
                .is_none()
        );

        let options = MatchOptions {
            ignore_search: true,
            ..MatchOptions::default()
        };
        let found = cache.match_request(&query, &options).await.unwrap().unwrap();
        assert_eq!(found.text().unwrap(), "v1");
    }

    #[tokio::test]
    async fn test_ignore_search_prefers_smallest_url() {
        let cache = MemoryCache::default();
        let base = url();
        for version in ["3", "1", "2"] {
            cache
                .put(
                    &Request::get(format!("{base}?v={version}")),
                    &Response::ok(format!("v{version}")),
                )
                .await
                .unwrap();
        }

        let options = MatchOptions {
            ignore_search: true,
            ..MatchOptions::default()
        };
        for _ in 0..5 {
            let found = cache
                .match_request(&Request::get(base.clone()), &options)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(found.text().unwrap(), "v1");
        }
    }

    #[tokio::test]
    async fn test_rejects_non_get_put() {
        let cache = MemoryCache::default();
        let request = Request::new(Method::Post, url());

        assert!(cache.put(&request, &Response::ok("x")).await.is_err());
        assert!(cache.is_empty().await);
    }
}
