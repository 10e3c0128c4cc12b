//! # Runtime Caching Library
//!
//! Caching strategies for intercepted requests: cache-first, cache-only,
//! network-first, network-only and stale-while-revalidate.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Router (not included)                      │
//! │        builds a RouteContext, picks a Strategy               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ handle(&RouteContext)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Strategies                             │
//! │  CacheFirst, CacheOnly, NetworkFirst, NetworkOnly, SWR       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RequestWrapper                           │
//! │       (cache name, options, lifecycle callbacks)             │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │     CacheStorage        │   │        Transport             │
//! │   (memory / Redis)      │   │     (reqwest HTTP)           │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `redis`: Enable the Redis cache store (default)
//! - `http`: Enable the reqwest transport (default)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use runtime_caching::{
//!     Behavior, Handler, RequestWrapper, RouteContext, StaleWhileRevalidate, WrapperOptions,
//! };
//!
//! let wrapper = RequestWrapper::with_options(WrapperOptions {
//!     cache_name: Some("avatars".to_string()),
//!     behaviors: vec![Behavior::new().on_cache_will_update(|r| r.status == 200)],
//!     ..WrapperOptions::default()
//! })?;
//!
//! let strategy = StaleWhileRevalidate::new(Arc::new(wrapper));
//! let response = strategy.handle(&RouteContext::new(event)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod network;
pub mod strategy;
pub mod validate;
pub mod wrapper;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

// Re-export commonly used types
pub use cache::{Cache, CacheStorage, MatchOptions, MemoryCacheStorage, SharedCacheStorage};
pub use config::{CachingConfig, StoreBackend};
pub use error::{Result, RuntimeCachingError, StorageError, TransportError, ValidationError};
pub use network::{FetchOptions, SharedTransport, Transport};
pub use runtime_caching_domain::{FetchEvent, Headers, Method, Request, Response, ResponseType};
pub use strategy::{
    CacheFirst, CacheOnly, Handler, NetworkFirst, NetworkOnly, RouteContext, StaleWhileRevalidate,
    Strategy, StrategyKind,
};
pub use wrapper::{Behavior, CacheUpdate, CallbackKind, RequestWrapper, WrapperOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Assemble storage, transport, wrapper and the configured strategy.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the transport cannot be
/// built.
pub async fn init(config: &CachingConfig, behaviors: Vec<Behavior>) -> Result<Strategy> {
    let storage = config.build_storage().await?;
    let transport = config.build_transport()?;

    let options = WrapperOptions {
        cache_name: Some(config.resolved_cache_name()),
        behaviors,
        ..WrapperOptions::default()
    };
    let wrapper = RequestWrapper::new(options, storage, transport)?;

    tracing::info!(
        cache_name = %wrapper.cache_name(),
        strategy = %config.strategy,
        store = %config.store,
        "Runtime caching initialized"
    );
    Ok(config.strategy.build(Arc::new(wrapper)))
}

/// [`init`] with configuration read from the environment and no behaviors.
///
/// # Errors
///
/// Same as [`init`], plus invalid strategy or store names.
pub async fn init_from_env() -> Result<Strategy> {
    let config = CachingConfig::from_env()?;
    init(&config, Vec::new()).await
}
