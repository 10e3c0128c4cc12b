use std::sync::Arc;

use async_trait::async_trait;

use runtime_caching_domain::Response;

use super::{Handler, RouteContext};
use crate::error::Result;
use crate::wrapper::RequestWrapper;

/// Answer from the cache; on a miss, fetch from the network and cache the
/// result.
#[derive(Debug, Clone)]
pub struct CacheFirst {
    wrapper: Arc<RequestWrapper>,
}

impl CacheFirst {
    pub fn new(wrapper: Arc<RequestWrapper>) -> Self {
        Self { wrapper }
    }
}

impl Default for CacheFirst {
    fn default() -> Self {
        Self::new(Arc::new(RequestWrapper::default()))
    }
}

#[async_trait]
impl Handler for CacheFirst {
    fn wrapper(&self) -> &Arc<RequestWrapper> {
        &self.wrapper
    }

    async fn handle(&self, context: &RouteContext) -> Result<Option<Response>> {
        let request = context.request()?;

        if let Some(cached) = self.wrapper.match_request(request).await? {
            return Ok(Some(cached));
        }
        Ok(Some(self.wrapper.fetch_and_cache(request).await?))
    }
}
