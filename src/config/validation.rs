//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and that the
//! header names and values the proxy will emit are well-formed. Every
//! violation is reported, not just the first.

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a [`ProxyConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("retries.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("upstream.domain must not be empty")]
    EmptyUpstreamDomain,

    #[error("{field} is not a valid header name: `{value}`")]
    InvalidHeaderName { field: &'static str, value: String },

    #[error("upstream.user_agent is not a valid header value")]
    InvalidUserAgent,

    #[error("upstream.max_connections_per_host must be greater than zero")]
    ZeroPoolSize,

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("observability.metrics_address is not a socket address: `{0}`")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }
    if config.upstream.domain.trim().is_empty() {
        errors.push(ValidationError::EmptyUpstreamDomain);
    }
    if HeaderName::from_bytes(config.admission.header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName {
            field: "admission.header",
            value: config.admission.header.clone(),
        });
    }
    if HeaderName::from_bytes(config.upstream.relay_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName {
            field: "upstream.relay_header",
            value: config.upstream.relay_header.clone(),
        });
    }
    if HeaderValue::from_str(&config.upstream.user_agent).is_err() {
        errors.push(ValidationError::InvalidUserAgent);
    }
    if config.upstream.max_connections_per_host == 0 {
        errors.push(ValidationError::ZeroPoolSize);
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn reports_all_errors() {
        let mut config = ProxyConfig::default();
        config.timeouts.request_secs = 0;
        config.retries.max_attempts = 0;
        config.upstream.domain = "  ".into();
        config.admission.header = "bad header".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroTimeout));
        assert!(errors.contains(&ValidationError::ZeroAttempts));
        assert!(errors.contains(&ValidationError::EmptyUpstreamDomain));
        assert!(errors.contains(&ValidationError::InvalidHeaderName {
            field: "admission.header",
            value: "bad header".into(),
        }));
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidMetricsAddress("nope".into())]
        );
    }
}
