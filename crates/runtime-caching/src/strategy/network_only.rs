use std::sync::Arc;

use async_trait::async_trait;

use runtime_caching_domain::Response;

use super::{Handler, RouteContext};
use crate::error::Result;
use crate::wrapper::RequestWrapper;

/// Always go to the network. The cache is neither read nor written.
#[derive(Debug, Clone)]
pub struct NetworkOnly {
    wrapper: Arc<RequestWrapper>,
}

impl NetworkOnly {
    pub fn new(wrapper: Arc<RequestWrapper>) -> Self {
        Self { wrapper }
    }
}

impl Default for NetworkOnly {
    fn default() -> Self {
        Self::new(Arc::new(RequestWrapper::default()))
    }
}

#[async_trait]
impl Handler for NetworkOnly {
    fn wrapper(&self) -> &Arc<RequestWrapper> {
        &self.wrapper
    }

    async fn handle(&self, context: &RouteContext) -> Result<Option<Response>> {
        let request = context.request()?;
        Ok(Some(self.wrapper.fetch(request).await?))
    }
}
