//! Strategy selection by name, with enum dispatch over the five strategies.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use runtime_caching_domain::Response;

use super::{
    CacheFirst, CacheOnly, Handler, NetworkFirst, NetworkOnly, RouteContext, StaleWhileRevalidate,
};
use crate::error::{Result, ValidationError};
use crate::validate;
use crate::wrapper::RequestWrapper;

/// Strategy names as used in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    CacheFirst,
    CacheOnly,
    #[default]
    NetworkFirst,
    NetworkOnly,
    StaleWhileRevalidate,
}

impl StrategyKind {
    pub const ALL: [Self; 5] = [
        Self::CacheFirst,
        Self::CacheOnly,
        Self::NetworkFirst,
        Self::NetworkOnly,
        Self::StaleWhileRevalidate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheFirst => "cache-first",
            Self::CacheOnly => "cache-only",
            Self::NetworkFirst => "network-first",
            Self::NetworkOnly => "network-only",
            Self::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }

    /// Build the strategy of this kind over `wrapper`.
    pub fn build(self, wrapper: Arc<RequestWrapper>) -> Strategy {
        match self {
            Self::CacheFirst => Strategy::CacheFirst(CacheFirst::new(wrapper)),
            Self::CacheOnly => Strategy::CacheOnly(CacheOnly::new(wrapper)),
            Self::NetworkFirst => Strategy::NetworkFirst(NetworkFirst::new(wrapper)),
            Self::NetworkOnly => Strategy::NetworkOnly(NetworkOnly::new(wrapper)),
            Self::StaleWhileRevalidate => {
                Strategy::StaleWhileRevalidate(StaleWhileRevalidate::new(wrapper))
            }
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        validate::parse_one_of("strategy", s, &Self::ALL)
    }
}

/// Any of the five strategies, dispatched by `match`.
#[derive(Debug, Clone)]
pub enum Strategy {
    CacheFirst(CacheFirst),
    CacheOnly(CacheOnly),
    NetworkFirst(NetworkFirst),
    NetworkOnly(NetworkOnly),
    StaleWhileRevalidate(StaleWhileRevalidate),
}

impl Strategy {
    pub fn new(kind: StrategyKind, wrapper: Arc<RequestWrapper>) -> Self {
        kind.build(wrapper)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::CacheFirst(_) => StrategyKind::CacheFirst,
            Self::CacheOnly(_) => StrategyKind::CacheOnly,
            Self::NetworkFirst(_) => StrategyKind::NetworkFirst,
            Self::NetworkOnly(_) => StrategyKind::NetworkOnly,
            Self::StaleWhileRevalidate(_) => StrategyKind::StaleWhileRevalidate,
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::NetworkFirst(NetworkFirst::default())
    }
}

#[async_trait]
impl Handler for Strategy {
    fn wrapper(&self) -> &Arc<RequestWrapper> {
        match self {
            Self::CacheFirst(s) => s.wrapper(),
            Self::CacheOnly(s) => s.wrapper(),
            Self::NetworkFirst(s) => s.wrapper(),
            Self::NetworkOnly(s) => s.wrapper(),
            Self::StaleWhileRevalidate(s) => s.wrapper(),
        }
    }

    async fn handle(&self, context: &RouteContext) -> Result<Option<Response>> {
        tracing::trace!(strategy = %self.kind(), "Handling request");
        match self {
            Self::CacheFirst(s) => s.handle(context).await,
            Self::CacheOnly(s) => s.handle(context).await,
            Self::NetworkFirst(s) => s.handle(context).await,
            Self::NetworkOnly(s) => s.handle(context).await,
            Self::StaleWhileRevalidate(s) => s.handle(context).await,
        }
    }
}

impl From<CacheFirst> for Strategy {
    fn from(strategy: CacheFirst) -> Self {
        Self::CacheFirst(strategy)
    }
}

impl From<CacheOnly> for Strategy {
    fn from(strategy: CacheOnly) -> Self {
        Self::CacheOnly(strategy)
    }
}

impl From<NetworkFirst> for Strategy {
    fn from(strategy: NetworkFirst) -> Self {
        Self::NetworkFirst(strategy)
    }
}

impl From<NetworkOnly> for Strategy {
    fn from(strategy: NetworkOnly) -> Self {
        Self::NetworkOnly(strategy)
    }
}

impl From<StaleWhileRevalidate> for Strategy {
    fn from(strategy: StaleWhileRevalidate) -> Self {
        Self::StaleWhileRevalidate(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use runtime_caching_domain::Request;

    use crate::test_support::{MockTransport, memory_wrapper, update_signal, wait_for_update};
    use crate::wrapper::Behavior;

    #[test]
    fn test_kind_names() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>(), Ok(kind));
        }
        assert_eq!(StrategyKind::default(), StrategyKind::NetworkFirst);
        assert_eq!(
            serde_json::to_string(&StrategyKind::StaleWhileRevalidate).unwrap(),
            "\"stale-while-revalidate\""
        );

        let err = "fastest".parse::<StrategyKind>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "The 'strategy' parameter must be set to one of the following: \
             cache-first,cache-only,network-first,network-only,stale-while-revalidate"
        );
    }

    #[tokio::test]
    async fn test_build_keeps_kind_and_wrapper() {
        let (wrapper, _, _) = memory_wrapper(MockTransport::ok(), Vec::new());

        for kind in StrategyKind::ALL {
            let strategy = Strategy::new(kind, Arc::clone(&wrapper));
            assert_eq!(strategy.kind(), kind);
            assert!(Arc::ptr_eq(strategy.wrapper(), &wrapper));
        }
    }

    #[tokio::test]
    async fn test_fetch_then_serve_from_cache() {
        let (signal, mut updates) = update_signal();
        let (wrapper, transport, _) = memory_wrapper(MockTransport::ok(), vec![signal]);
        let context = RouteContext::for_request(Request::get("https://app.test/a.json"));

        let fetched = Strategy::new(StrategyKind::NetworkFirst, Arc::clone(&wrapper))
            .handle(&context)
            .await
            .unwrap()
            .unwrap();
        let update = wait_for_update(&mut updates).await;
        let cached = Strategy::new(StrategyKind::CacheOnly, wrapper)
            .handle(&context)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(transport.call_count(), 1);
        assert_eq!(update.cache_name, "test-cache");
        assert_eq!(cached.status, fetched.status);
        assert_eq!(cached.body(), fetched.body());
    }

    #[tokio::test]
    async fn test_vetoed_response_is_never_served_from_cache() {
        let veto = Behavior::new().on_cache_will_update(|_| false);
        let (wrapper, transport, _) = memory_wrapper(MockTransport::ok(), vec![veto]);
        let context = RouteContext::for_request(Request::get("https://app.test/b.json"));

        let fetched = Strategy::new(StrategyKind::CacheFirst, Arc::clone(&wrapper))
            .handle(&context)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let cached = Strategy::from(CacheOnly::new(wrapper)).handle(&context).await.unwrap();

        assert!(fetched.is_some());
        assert!(cached.is_none());
        assert_eq!(transport.call_count(), 1);
    }
}
