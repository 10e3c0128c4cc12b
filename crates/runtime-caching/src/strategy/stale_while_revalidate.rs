use std::sync::Arc;

use async_trait::async_trait;

use runtime_caching_domain::Response;

use super::{Handler, RouteContext};
use crate::error::Result;
use crate::validate;
use crate::wrapper::RequestWrapper;

/// Answer from the cache immediately while a background fetch refreshes it.
///
/// The revalidation starts before the cache lookup. On a hit the cached
/// response is returned and the revalidation keeps running detached. On a
/// miss the revalidation result is awaited; a failed revalidation yields
/// [`Response::error()`] rather than an error.
#[derive(Debug, Clone)]
pub struct StaleWhileRevalidate {
    wrapper: Arc<RequestWrapper>,
}

impl StaleWhileRevalidate {
    pub fn new(wrapper: Arc<RequestWrapper>) -> Self {
        Self { wrapper }
    }
}

impl Default for StaleWhileRevalidate {
    fn default() -> Self {
        Self::new(Arc::new(RequestWrapper::default()))
    }
}

#[async_trait]
impl Handler for StaleWhileRevalidate {
    fn wrapper(&self) -> &Arc<RequestWrapper> {
        &self.wrapper
    }

    async fn handle(&self, context: &RouteContext) -> Result<Option<Response>> {
        let request = context.request()?;
        validate::is_host_env()?;

        let wrapper = Arc::clone(&self.wrapper);
        let outgoing = request.clone();
        let revalidation = tokio::spawn(async move {
            match wrapper.fetch_and_cache(&outgoing).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(url = %outgoing.url, error = %e, "Revalidation failed");
                    Response::error()
                }
            }
        });

        if let Some(cached) = self.wrapper.match_request(request).await? {
            return Ok(Some(cached));
        }

        match revalidation.await {
            Ok(response) => Ok(Some(response)),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "Revalidation task aborted");
                Ok(Some(Response::error()))
            }
        }
    }
}
