//! Header sanitization in both directions.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers from requests and responses
//! - Force Host to the synthesized upstream authority
//! - Remove the upstream's relay-detection header
//! - Force a fixed User-Agent
//!
//! # Design Decisions
//! - Filtering is a pure `HeaderMap -> HeaderMap` function
//! - Repeated headers are appended, never merged or deduplicated
//! - Names are matched case-insensitively (`HeaderName` is lowercase)

use axum::http::header::{HOST, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::schema::UpstreamConfig;
use crate::config::validation::ValidationError;

/// Headers meaningful only for a single transport leg.
pub const HOP_BY_HOP_HEADERS: [&str; 10] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
];

/// Returns true if `name` must not cross the proxy.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Copy every header except the hop-by-hop set and those rejected by `skip`.
fn copy_filtered<F>(source: &HeaderMap, skip: F) -> HeaderMap
where
    F: Fn(&HeaderName) -> bool,
{
    let mut out = HeaderMap::with_capacity(source.len());
    for (name, value) in source.iter() {
        if is_hop_by_hop(name) || skip(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Upstream response headers as relayed to the caller.
pub fn sanitize_response_headers(upstream: &HeaderMap) -> HeaderMap {
    copy_filtered(upstream, |_| false)
}

/// Outbound header rules, parsed once from [`UpstreamConfig`].
#[derive(Debug, Clone)]
pub struct HeaderRules {
    relay_header: HeaderName,
    user_agent: HeaderValue,
}

impl HeaderRules {
    pub fn new(relay_header: HeaderName, user_agent: HeaderValue) -> Self {
        Self {
            relay_header,
            user_agent,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, ValidationError> {
        let relay_header = HeaderName::from_bytes(config.relay_header.as_bytes()).map_err(|_| {
            ValidationError::InvalidHeaderName {
                field: "upstream.relay_header",
                value: config.relay_header.clone(),
            }
        })?;
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| ValidationError::InvalidUserAgent)?;
        Ok(Self::new(relay_header, user_agent))
    }

    /// Inbound request headers as sent upstream.
    ///
    /// Host is replaced by `host`, the relay-detection header is removed and
    /// User-Agent is overridden, regardless of what the caller sent.
    pub fn sanitize_request_headers(&self, inbound: &HeaderMap, host: HeaderValue) -> HeaderMap {
        let mut out = copy_filtered(inbound, |name| *name == HOST);
        out.insert(HOST, host);
        out.remove(&self.relay_header);
        out.insert(USER_AGENT, self.user_agent.clone());
        out
    }
}
