//! Outbound HTTP client.
//!
//! # Responsibilities
//! - Define the [`UpstreamClient`] seam the forwarding pipeline calls
//! - Provide the production implementation over hyper-util + rustls
//! - Bound each call (connect, headers and body) by the per-call timeout
//! - Cap concurrent exchanges, and so open connections, per upstream authority
//!
//! # Design Decisions
//! - One pooled client is shared by all requests; it is never mutated
//! - TLS 1.2 and 1.3 only, native root certificates
//! - HTTP/1.1 only on the upstream leg
//! - The response body is read inside the call so a broken body is a
//!   transport failure, retried like any other
//! - A per-authority permit is held from before connect until the body is
//!   read; waiting for it counts against the call timeout

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{Request, Response};
use bytes::Bytes;
use dashmap::DashMap;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use thiserror::Error;
use tokio::sync::{AcquireError, Semaphore};

use crate::config::schema::UpstreamConfig;

/// Failure to obtain a complete upstream response.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("failed reading upstream body: {0}")]
    Body(#[from] hyper::Error),

    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("connection limiter closed: {0}")]
    Limiter(#[from] AcquireError),
}

/// Sends one fully-buffered request and returns the fully-buffered response.
///
/// Any HTTP status is `Ok`; `Err` means the exchange itself failed.
#[async_trait]
pub trait UpstreamClient: Send + Sync + 'static {
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, UpstreamError>;
}

/// Pooled HTTPS client used in production.
#[derive(Clone)]
pub struct HttpsUpstream {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
    max_per_host: usize,
    permits: Arc<DashMap<String, Arc<Semaphore>>>,
}

impl HttpsUpstream {
    pub fn new(config: &UpstreamConfig, timeout: Duration) -> Result<Self, UpstreamError> {
        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);
        http_connector.set_connect_timeout(Some(timeout));
        http_connector.set_nodelay(true);

        let mut roots = rustls::RootCertStore::empty();
        let native_certs = rustls_native_certs::load_native_certs();
        for cert in native_certs.certs {
            if roots.add(cert).is_err() {
                tracing::warn!("Failed to add native certificate to rustls RootCertStore");
            }
        }
        if !native_certs.errors.is_empty() {
            tracing::warn!(
                errors = ?native_certs.errors,
                "Some native certificates failed to load"
            );
        }
        if roots.is_empty() {
            tracing::warn!("No root certificates loaded; upstream TLS handshakes will fail");
        } else {
            tracing::debug!(count = roots.len(), "Loaded native root certificates");
        }

        let tls_config = rustls::ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])?
        .with_root_certificates(roots)
        .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_only()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(config.idle_timeout())
            .pool_max_idle_per_host(config.max_connections_per_host)
            .build(https_connector);

        Ok(Self {
            client,
            timeout,
            max_per_host: config.max_connections_per_host.min(Semaphore::MAX_PERMITS),
            permits: Arc::new(DashMap::new()),
        })
    }

    /// The connection limiter for `authority`, created on first use.
    fn limiter(&self, authority: &str) -> Arc<Semaphore> {
        self.permits
            .entry(authority.to_ascii_lowercase())
            .or_insert_with(|| Arc::new(Semaphore::new(self.max_per_host)))
            .value()
            .clone()
    }
}

#[async_trait]
impl UpstreamClient for HttpsUpstream {
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, UpstreamError> {
        let limiter = self.limiter(
            request
                .uri()
                .authority()
                .map(|authority| authority.as_str())
                .unwrap_or_default(),
        );
        let request = request.map(Full::new);

        let exchange = async {
            let _permit = limiter.acquire_owned().await?;
            let response = self.client.request(request).await?;
            let (parts, body) = response.into_parts();
            let body = body.collect().await?.to_bytes();
            Ok::<_, UpstreamError>(Response::from_parts(parts, body))
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| UpstreamError::Timeout(self.timeout))?
    }
}
