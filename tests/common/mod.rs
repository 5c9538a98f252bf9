//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{Request, Response, StatusCode};
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use roproxy::http::{HttpServer, UpstreamClient, UpstreamError};
use roproxy::ProxyConfig;

type Responder = dyn Fn(&Request<Bytes>) -> Response<Bytes> + Send + Sync;

/// A programmable upstream that records every outbound request it sees.
pub struct MockUpstream {
    calls: AtomicU32,
    failures_before_success: u32,
    responder: Box<Responder>,
    seen: Mutex<Vec<Request<Bytes>>>,
}

impl MockUpstream {
    /// Answer every call with `responder`.
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&Request<Bytes>) -> Response<Bytes> + Send + Sync + 'static,
    {
        Self::failing_then(0, responder)
    }

    /// Fail the first `failures` calls at the transport level, then answer.
    pub fn failing_then<F>(failures: u32, responder: F) -> Arc<Self>
    where
        F: Fn(&Request<Bytes>) -> Response<Bytes> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            failures_before_success: failures,
            responder: Box::new(responder),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Never answers; every call is a transport failure.
    #[allow(dead_code)]
    pub fn unreachable() -> Arc<Self> {
        Self::failing_then(u32::MAX, |_| ok("unreachable"))
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests that reached the upstream, in order.
    pub fn seen(&self) -> Vec<Request<Bytes>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|req| {
                let mut copy = Request::new(req.body().clone());
                *copy.method_mut() = req.method().clone();
                *copy.uri_mut() = req.uri().clone();
                *copy.headers_mut() = req.headers().clone();
                copy
            })
            .collect()
    }
}

#[async_trait]
impl UpstreamClient for MockUpstream {
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, UpstreamError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let response = (self.responder)(&request);
        self.seen.lock().unwrap().push(request);

        if call < self.failures_before_success {
            return Err(UpstreamError::Timeout(Duration::from_millis(1)));
        }
        Ok(response)
    }
}

/// Plain 200 response with a text body.
pub fn ok(body: &'static str) -> Response<Bytes> {
    Response::new(Bytes::from_static(body.as_bytes()))
}

/// Response with the given status and body.
#[allow(dead_code)]
pub fn status(code: u16, body: &'static str) -> Response<Bytes> {
    let mut response = ok(body);
    *response.status_mut() = StatusCode::from_u16(code).unwrap();
    response
}

/// Defaults tuned for fast tests.
pub fn test_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.retries.base_delay_ms = 10;
    config
}

/// A running proxy bound to an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Start the proxy in front of `upstream`.
pub async fn start_proxy(config: ProxyConfig, upstream: Arc<MockUpstream>) -> TestProxy {
    let listener = TcpListener::bind(config.listener.bind_address()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::with_upstream(config, upstream).unwrap();

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = server
            .run(listener, async {
                let _ = rx.await;
            })
            .await;
    });

    TestProxy {
        addr,
        shutdown: Some(tx),
    }
}

/// HTTP client that talks straight to the proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
