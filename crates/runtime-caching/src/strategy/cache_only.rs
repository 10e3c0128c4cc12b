use std::sync::Arc;

use async_trait::async_trait;

use runtime_caching_domain::Response;

use super::{Handler, RouteContext};
use crate::error::Result;
use crate::wrapper::RequestWrapper;

/// Answer from the cache only. A miss is `Ok(None)`.
#[derive(Debug, Clone)]
pub struct CacheOnly {
    wrapper: Arc<RequestWrapper>,
}

impl CacheOnly {
    pub fn new(wrapper: Arc<RequestWrapper>) -> Self {
        Self { wrapper }
    }
}

impl Default for CacheOnly {
    fn default() -> Self {
        Self::new(Arc::new(RequestWrapper::default()))
    }
}

#[async_trait]
impl Handler for CacheOnly {
    fn wrapper(&self) -> &Arc<RequestWrapper> {
        &self.wrapper
    }

    async fn handle(&self, context: &RouteContext) -> Result<Option<Response>> {
        let request = context.request()?;
        self.wrapper.match_request(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use fake::Fake;
    use fake::faker::lorem::en::Word;
    use runtime_caching_domain::Request;

    use crate::error::RuntimeCachingError;
    use crate::test_support::{MockTransport, memory_wrapper, seed};

    #[tokio::test]
    async fn test_empty_cache_returns_none() {
        let (wrapper, transport, _) = memory_wrapper(MockTransport::ok(), Vec::new());
        let strategy = CacheOnly::new(wrapper);

        for _ in 0..5 {
            let path: String = Word().fake();
            let context = RouteContext::for_request(Request::get(format!("https://a.test/{path}")));
            assert!(strategy.handle(&context).await.unwrap().is_none());
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_returns_cached_entry() {
        let (wrapper, _, storage) = memory_wrapper(MockTransport::ok(), Vec::new());
        let request = Request::get("https://a.test/offline.html");
        seed(&storage, &request, Response::ok("offline")).await;

        let response = CacheOnly::new(wrapper)
            .handle(&RouteContext::for_request(request))
            .await
            .unwrap();

        assert_eq!(response.unwrap().text().unwrap(), "offline");
    }

    #[tokio::test]
    async fn test_missing_event_is_rejected() {
        let (wrapper, _, _) = memory_wrapper(MockTransport::ok(), Vec::new());

        let err = CacheOnly::new(wrapper)
            .handle(&RouteContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RuntimeCachingError::Validation(_)));
    }
}
