use std::sync::Arc;

use async_trait::async_trait;

use runtime_caching_domain::Response;

use super::{Handler, RouteContext};
use crate::error::Result;
use crate::wrapper::RequestWrapper;

/// Fetch and cache; when the network fails, fall back to whatever the cache
/// holds. A network failure with an empty cache is `Ok(None)`.
#[derive(Debug, Clone)]
pub struct NetworkFirst {
    wrapper: Arc<RequestWrapper>,
}

impl NetworkFirst {
    pub fn new(wrapper: Arc<RequestWrapper>) -> Self {
        Self { wrapper }
    }
}

impl Default for NetworkFirst {
    fn default() -> Self {
        Self::new(Arc::new(RequestWrapper::default()))
    }
}

#[async_trait]
impl Handler for NetworkFirst {
    fn wrapper(&self) -> &Arc<RequestWrapper> {
        &self.wrapper
    }

    async fn handle(&self, context: &RouteContext) -> Result<Option<Response>> {
        let request = context.request()?;

        match self.wrapper.fetch_and_cache(request).await {
            Ok(response) => Ok(Some(response)),
            Err(e) => {
                tracing::debug!(
                    cache_name = %self.wrapper.cache_name(),
                    url = %request.url,
                    error = %e,
                    "Network failed, falling back to cache"
                );
                self.wrapper.match_request(request).await
            }
        }
    }
}
