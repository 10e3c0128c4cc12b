//! Input handed to a strategy by the router.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use runtime_caching_domain::{FetchEvent, Request};

use crate::validate::{self, ValidationResult};

/// The triggering event plus optional router-supplied parameters.
///
/// Owned by the caller; strategies only read it.
#[derive(Clone, Default)]
pub struct RouteContext {
    pub event: Option<FetchEvent>,
    pub params: Option<Arc<dyn Any + Send + Sync>>,
}

impl RouteContext {
    pub fn new(event: FetchEvent) -> Self {
        Self {
            event: Some(event),
            params: None,
        }
    }

    pub fn for_request(request: Request) -> Self {
        Self::new(FetchEvent::new(request))
    }

    #[must_use]
    pub fn with_params<T: Any + Send + Sync>(mut self, params: T) -> Self {
        self.params = Some(Arc::new(params));
        self
    }

    /// The request of the triggering event. Fails when there is no event.
    pub fn request(&self) -> ValidationResult<&Request> {
        validate::required("event", self.event.as_ref()).map(|event| &event.request)
    }

    /// Router parameters as a `T`, or `None` when the router passed none.
    pub fn params<T: Any>(&self) -> ValidationResult<Option<&T>> {
        self.params
            .as_deref()
            .map(|params| validate::is_instance::<T>("params", params))
            .transpose()
    }
}

impl fmt::Debug for RouteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteContext")
            .field("event", &self.event)
            .field("params", &self.params.is_some())
            .finish()
    }
}
