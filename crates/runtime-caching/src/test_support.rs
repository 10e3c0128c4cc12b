//! Fixtures shared by the unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use runtime_caching_domain::{Request, Response};

use crate::cache::{Cache, MemoryCacheStorage};
use crate::error::TransportError;
use crate::network::{FetchOptions, Transport};
use crate::wrapper::{Behavior, RequestWrapper, WrapperOptions};

type Responder = Box<dyn Fn(&Request) -> Result<Response, TransportError> + Send + Sync>;

/// Scripted transport that records every request it sees
pub(crate) struct MockTransport {
    responder: Responder,
    requests: Mutex<Vec<Request>>,
    hang: bool,
}

impl MockTransport {
    pub(crate) fn with<F>(responder: F) -> Self
    where
        F: Fn(&Request) -> Result<Response, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            hang: false,
        }
    }

    /// 200 with body `network:{url}`
    pub(crate) fn ok() -> Self {
        Self::with(|r| Ok(Response::ok(format!("network:{}", r.url)).with_url(r.url.clone())))
    }

    pub(crate) fn failing() -> Self {
        Self::with(|r| Err(TransportError::Http(format!("connection refused: {}", r.url))))
    }

    /// Records the request, then never answers
    pub(crate) fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::ok()
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(
        &self,
        request: &Request,
        _options: &FetchOptions,
    ) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.hang {
            std::future::pending::<()>().await;
        }
        (self.responder)(request)
    }
}

/// Owned copy of a `cache_did_update` payload
#[derive(Debug)]
pub(crate) struct RecordedUpdate {
    pub(crate) cache_name: String,
    pub(crate) old_response: Option<Response>,
    pub(crate) new_response: Response,
}

/// A behavior that reports every cache write on a channel
pub(crate) fn update_signal() -> (Behavior, mpsc::UnboundedReceiver<RecordedUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let behavior = Behavior::new().on_cache_did_update(move |update| {
        tx.send(RecordedUpdate {
            cache_name: update.cache_name.to_string(),
            old_response: update.old_response.cloned(),
            new_response: update.new_response.clone(),
        })?;
        Ok(())
    });
    (behavior, rx)
}

pub(crate) async fn wait_for_update(
    updates: &mut mpsc::UnboundedReceiver<RecordedUpdate>,
) -> RecordedUpdate {
    tokio::time::timeout(Duration::from_secs(1), updates.recv())
        .await
        .expect("timed out waiting for cache update")
        .expect("update channel closed")
}

/// Route `tracing` output through the test harness, filtered by `RUST_LOG`
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Wrapper over a fresh memory storage with cache name `test-cache`
pub(crate) fn memory_wrapper(
    transport: MockTransport,
    behaviors: Vec<Behavior>,
) -> (Arc<RequestWrapper>, Arc<MockTransport>, Arc<MemoryCacheStorage>) {
    init_tracing();
    let transport = Arc::new(transport);
    let storage = Arc::new(MemoryCacheStorage::new());
    let options = WrapperOptions {
        cache_name: Some("test-cache".to_string()),
        behaviors,
        ..WrapperOptions::default()
    };
    let wrapper = RequestWrapper::new(options, storage.clone(), transport.clone())
        .expect("valid wrapper options");
    (Arc::new(wrapper), transport, storage)
}

/// Write an entry straight into the `test-cache` store
pub(crate) async fn seed(storage: &MemoryCacheStorage, request: &Request, response: Response) {
    storage
        .cache("test-cache")
        .await
        .put(request, &response)
        .await
        .expect("seed entry");
}
