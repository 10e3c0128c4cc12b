//! # Strategy Module
//!
//! Request-handling strategies that decide, per request, whether to answer
//! from the cache, the network, or both.
//!
//! ## Available Strategies
//!
//! - `CacheFirst` - Answer from cache, fetch and cache on a miss
//! - `CacheOnly` - Answer from cache, never touch the network
//! - `NetworkFirst` - Fetch and cache, fall back to the cache on failure (default)
//! - `NetworkOnly` - Fetch, never touch the cache
//! - `StaleWhileRevalidate` - Answer from cache while refreshing it in the background
//!
//! Every strategy implements [`Handler`]. The [`Strategy`] enum wraps all
//! five and dispatches by `match`, so a router can hold any of them by value.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use runtime_caching::strategy::{Handler, RouteContext, StaleWhileRevalidate};
//!
//! let swr = StaleWhileRevalidate::new(Arc::new(wrapper));
//! let response = swr.handle(&RouteContext::new(event)).await?;
//! ```

pub mod cache_first;
pub mod cache_only;
pub mod context;
pub mod dispatch;
pub mod network_first;
pub mod network_only;
pub mod stale_while_revalidate;

use std::sync::Arc;

use async_trait::async_trait;

use runtime_caching_domain::Response;

use crate::error::{Result, RuntimeCachingError};
use crate::wrapper::RequestWrapper;

pub use cache_first::CacheFirst;
pub use cache_only::CacheOnly;
pub use context::RouteContext;
pub use dispatch::{Strategy, StrategyKind};
pub use network_first::NetworkFirst;
pub use network_only::NetworkOnly;
pub use stale_while_revalidate::StaleWhileRevalidate;

/// Contract shared by every strategy.
#[async_trait]
pub trait Handler: Send + Sync {
    /// The wrapper all cache and network access goes through
    fn wrapper(&self) -> &Arc<RequestWrapper>;

    /// Produce a response for the request in `context`.
    ///
    /// `Ok(None)` means no response was found. The provided implementation
    /// always fails; concrete strategies override it.
    async fn handle(&self, _context: &RouteContext) -> Result<Option<Response>> {
        Err(RuntimeCachingError::NotImplemented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use runtime_caching_domain::Request;

    use crate::test_support::{MockTransport, memory_wrapper};

    struct Unfinished {
        wrapper: Arc<RequestWrapper>,
    }

    impl Handler for Unfinished {
        fn wrapper(&self) -> &Arc<RequestWrapper> {
            &self.wrapper
        }
    }

    #[tokio::test]
    async fn test_base_handle_is_not_implemented() {
        let (wrapper, transport, _) = memory_wrapper(MockTransport::ok(), Vec::new());
        let handler = Unfinished { wrapper };

        let err = handler
            .handle(&RouteContext::for_request(Request::get("https://a.test/x")))
            .await
            .unwrap_err();

        assert!(matches!(err, RuntimeCachingError::NotImplemented));
        assert_eq!(transport.call_count(), 0);
        assert_eq!(handler.wrapper().cache_name(), "test-cache");
    }
}
