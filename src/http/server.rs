//! HTTP server setup and the forwarding handler.
//!
//! # Responsibilities
//! - Create the Axum Router with the admission gate and tracing layers
//! - Translate the request-target into an upstream target
//! - Buffer the inbound body once for replay
//! - Forward through the retry loop and relay the result
//!
//! # Cancellation
//! If the caller disconnects, hyper drops the handler future and with it
//! the in-flight upstream call or backoff sleep.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::Response,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::validation::ValidationError;
use crate::config::ProxyConfig;
use crate::http::client::{HttpsUpstream, UpstreamClient, UpstreamError};
use crate::http::request::ForwardPlan;
use crate::http::response;
use crate::observability::metrics::{self, Outcome};
use crate::resilience::{RetryOutcome, RetryPolicy};
use crate::routing::RoutingTarget;
use crate::security::{admission_gate, AdmissionGate, HeaderRules};

/// Errors building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("failed to build upstream client: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub upstream: Arc<dyn UpstreamClient>,
    pub rules: HeaderRules,
    pub retry: RetryPolicy,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a server forwarding over the production HTTPS client.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let upstream = HttpsUpstream::new(&config.upstream, config.timeouts.request())?;
        Self::with_upstream(config, Arc::new(upstream))
    }

    /// Create a server forwarding through `upstream`.
    pub fn with_upstream(
        config: ProxyConfig,
        upstream: Arc<dyn UpstreamClient>,
    ) -> Result<Self, ServerError> {
        let gate = AdmissionGate::from_config(&config.admission)?;
        let rules = HeaderRules::from_config(&config.upstream)?;
        let retry = RetryPolicy::from_config(&config.retries);
        let config = Arc::new(config);

        let state = AppState {
            config: config.clone(),
            upstream,
            rules,
            retry,
        };

        let router = Self::build_router(state, gate);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Every path and method lands in the proxy handler; the gate wraps it.
    fn build_router(state: AppState, gate: AdmissionGate) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(middleware::from_fn_with_state(gate, admission_gate))
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for serving or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream_domain = %self.config.upstream.domain,
            max_attempts = self.config.retries.max_attempts,
            admission = self.config.admission.secret.is_some(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler: translate, buffer, forward with retries, relay.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    let target = match RoutingTarget::from_uri(request.uri()) {
        Ok(target) => target,
        Err(error) => {
            tracing::debug!(uri = %request.uri(), %error, "Malformed request target");
            metrics::record_request(method.as_str(), 400, Outcome::Malformed);
            return response::malformed_route();
        }
    };

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.config.limits.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(
                limit = state.config.limits.max_body_bytes,
                %error,
                "Failed to buffer request body"
            );
            metrics::record_request(method.as_str(), 413, Outcome::TooLarge);
            return response::body_too_large();
        }
    };

    let plan = match ForwardPlan::new(
        &parts,
        body,
        &target,
        &state.config.upstream.domain,
        &state.rules,
    ) {
        Ok(plan) => plan,
        Err(error) => {
            tracing::debug!(uri = %parts.uri, %error, "Request target has no valid upstream");
            metrics::record_request(method.as_str(), 400, Outcome::Malformed);
            return response::malformed_route();
        }
    };

    let span = tracing::info_span!(
        "forward",
        request_id = %Uuid::new_v4(),
        method = %plan.method(),
        target = %plan.uri(),
    );

    let outcome = state
        .retry
        .run(|attempt| {
            tracing::debug!(attempt, "Proxy attempt");
            state.upstream.send(plan.build())
        })
        .instrument(span.clone())
        .await;

    let response = span.in_scope(|| match outcome {
        RetryOutcome::Succeeded { value, attempts } => {
            let status = value.status();
            tracing::info!(status = status.as_u16(), attempts, "Relaying upstream response");
            metrics::record_request(method.as_str(), status.as_u16(), Outcome::Relayed);
            response::relay(value)
        }
        RetryOutcome::Exhausted { attempts } => {
            tracing::error!(attempts, "Giving up on upstream");
            metrics::record_request(method.as_str(), 500, Outcome::Exhausted);
            response::relay(response::retries_exhausted())
        }
    });
    metrics::record_duration(start_time);

    response
}
