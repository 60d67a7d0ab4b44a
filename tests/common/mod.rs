#![allow(dead_code)]

use axum::extract::ConnectInfo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;

use shortlink::application::services::LinkService;
use shortlink::domain::click_queue::ClickQueue;
use shortlink::domain::entities::{Link, NewLink};
use shortlink::domain::liveness::LivenessTable;
use shortlink::domain::rate_limiter::RateLimiter;
use shortlink::domain::repositories::LinkRepository;
use shortlink::infrastructure::persistence::InMemoryStore;
use shortlink::state::AppState;

pub const BASE_URL: &str = "http://sho.rt";

/// Everything a handler test needs: the state plus direct handles on the
/// store and the click queue.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub queue: Arc<ClickQueue>,
}

pub struct TestOptions {
    pub queue_capacity: usize,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
    pub behind_proxy: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            rate_limit_requests: 1_000,
            rate_limit_window: Duration::from_secs(60),
            behind_proxy: false,
        }
    }
}

pub fn create_test_state() -> TestContext {
    create_test_state_with(TestOptions::default())
}

pub fn create_test_state_with(options: TestOptions) -> TestContext {
    let store = Arc::new(InMemoryStore::new());
    let queue = ClickQueue::shared(options.queue_capacity);

    let link_service = Arc::new(LinkService::new(store.clone(), store.clone()));

    let state = AppState::new(
        link_service,
        queue.clone(),
        Arc::new(RateLimiter::new(
            options.rate_limit_requests,
            options.rate_limit_window,
        )),
        Arc::new(LivenessTable::new()),
        BASE_URL,
        options.behind_proxy,
    );

    TestContext {
        state,
        store,
        queue,
    }
}

pub async fn create_test_link(store: &InMemoryStore, code: &str, url: &str) -> Link {
    LinkRepository::create(
        store,
        NewLink {
            code: code.to_string(),
            long_url: url.to_string(),
        },
    )
    .await
    .unwrap()
}

/// Injects a fixed peer address the way `into_make_service_with_connect_info`
/// does for real connections.
#[derive(Clone)]
pub struct MockConnectInfoLayer(pub SocketAddr);

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            addr: self.0,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    addr: SocketAddr,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(ConnectInfo(self.addr));
        self.inner.call(req)
    }
}

pub fn peer(addr: &str) -> MockConnectInfoLayer {
    MockConnectInfoLayer(addr.parse().unwrap())
}
