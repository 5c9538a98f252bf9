//! Path-to-target translation.
//!
//! # Responsibilities
//! - Split the request-target into a subdomain label and a remainder
//! - Synthesize the upstream authority `{label}.{domain}`
//! - Synthesize the upstream URI `https://{label}.{domain}/{remainder}`
//!
//! # Design Decisions
//! - Exactly one leading '/' is stripped; "//x/y" yields an empty label
//! - A target without a second segment ("/games") is rejected
//! - Labels are restricted to hostname characters so the suffix domain
//!   can never be escaped (no userinfo, port or query smuggling)

use std::str::FromStr;

use axum::http::uri::{Authority, Scheme};
use axum::http::Uri;
use thiserror::Error;

/// Why a request-target could not be turned into a [`RoutingTarget`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("request target has no path after the subdomain segment")]
    MissingRemainder,

    #[error("subdomain segment is empty")]
    EmptySubdomain,

    #[error("subdomain segment `{0}` is not a valid host label")]
    InvalidSubdomain(String),

    #[error("`{0}` does not form a valid upstream URI")]
    InvalidUri(String),
}

/// Upstream destination derived from the first path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTarget {
    subdomain: String,
    remainder: String,
}

impl RoutingTarget {
    /// Parse a raw request-target (path plus optional query).
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let trimmed = raw.strip_prefix('/').unwrap_or(raw);

        let (subdomain, remainder) = trimmed
            .split_once('/')
            .ok_or(RouteError::MissingRemainder)?;

        if subdomain.is_empty() {
            return Err(RouteError::EmptySubdomain);
        }
        if !subdomain.bytes().all(is_label_byte) {
            return Err(RouteError::InvalidSubdomain(subdomain.to_string()));
        }

        Ok(Self {
            subdomain: subdomain.to_string(),
            remainder: remainder.to_string(),
        })
    }

    /// Parse the path and query of an inbound request URI.
    pub fn from_uri(uri: &Uri) -> Result<Self, RouteError> {
        let raw = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("");
        Self::parse(raw)
    }

    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    /// Everything after the subdomain segment, query included. May be empty.
    pub fn remainder(&self) -> &str {
        &self.remainder
    }

    /// `{subdomain}.{domain}`, used both as URI authority and Host header.
    pub fn authority(&self, domain: &str) -> Result<Authority, RouteError> {
        let host = format!("{}.{}", self.subdomain, domain);
        Authority::from_str(&host).map_err(|_| RouteError::InvalidUri(host))
    }

    /// `https://{subdomain}.{domain}/{remainder}`.
    pub fn upstream_uri(&self, domain: &str) -> Result<Uri, RouteError> {
        let authority = self.authority(domain)?;
        let path_and_query = format!("/{}", self.remainder);

        Uri::builder()
            .scheme(Scheme::HTTPS)
            .authority(authority.clone())
            .path_and_query(path_and_query.as_str())
            .build()
            .map_err(|_| RouteError::InvalidUri(format!("https://{}{}", authority, path_and_query)))
    }
}

fn is_label_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.'
}
