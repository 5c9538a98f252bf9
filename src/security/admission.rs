//! Shared-secret admission gate.
//!
//! When a secret is configured, every request must carry it verbatim in the
//! admission header (`PROXYKEY` by default). Anything else is answered with
//! 407 before path translation or any upstream work happens.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, Request},
    middleware::Next,
    response::Response,
};

use crate::config::schema::AdmissionConfig;
use crate::config::validation::ValidationError;
use crate::http::response;
use crate::observability::metrics;

/// Admit/reject decision over request headers.
#[derive(Clone)]
pub struct AdmissionGate {
    header: HeaderName,
    secret: Option<Arc<str>>,
}

impl AdmissionGate {
    pub fn new(header: HeaderName, secret: Option<String>) -> Self {
        Self {
            header,
            secret: secret.map(Arc::from),
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Result<Self, ValidationError> {
        let header = HeaderName::from_bytes(config.header.as_bytes()).map_err(|_| {
            ValidationError::InvalidHeaderName {
                field: "admission.header",
                value: config.header.clone(),
            }
        })?;
        Ok(Self::new(header, config.secret.clone()))
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Byte-exact, case-sensitive comparison of the header value.
    pub fn admits(&self, headers: &HeaderMap) -> bool {
        match &self.secret {
            None => true,
            Some(secret) => headers
                .get(&self.header)
                .map(|value| value.as_bytes() == secret.as_bytes())
                .unwrap_or(false),
        }
    }
}

impl std::fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("header", &self.header)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Middleware enforcing [`AdmissionGate`] ahead of the proxy handler.
pub async fn admission_gate(
    State(gate): State<AdmissionGate>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if gate.admits(request.headers()) {
        return next.run(request).await;
    }

    tracing::warn!(
        method = %request.method(),
        uri = %request.uri(),
        header = %gate.header,
        "Rejected request with missing or invalid admission header"
    );
    metrics::record_request(request.method().as_str(), 407, metrics::Outcome::Rejected);
    response::admission_rejected()
}
