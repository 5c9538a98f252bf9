//! Outbound request synthesis.
//!
//! # Responsibilities
//! - Keep the inbound method, headers and body buffered for replay
//! - Compute the upstream URI and Host once per inbound request
//! - Produce a fresh outbound request for every attempt
//!
//! # Design Decisions
//! - The body is held as `Bytes`; cloning per attempt is a refcount bump
//! - A failed attempt consumes only its own copy, never the buffered body

use axum::http::{request::Parts, HeaderMap, HeaderValue, Method, Request, Uri};
use bytes::Bytes;

use crate::routing::{RouteError, RoutingTarget};
use crate::security::HeaderRules;

/// Everything needed to rebuild the outbound request on each attempt.
#[derive(Debug, Clone)]
pub struct ForwardPlan {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl ForwardPlan {
    /// Synthesize the outbound side of an inbound request.
    pub fn new(
        parts: &Parts,
        body: Bytes,
        target: &RoutingTarget,
        domain: &str,
        rules: &HeaderRules,
    ) -> Result<Self, RouteError> {
        let uri = target.upstream_uri(domain)?;
        let authority = target.authority(domain)?;
        let host = HeaderValue::from_str(authority.as_str())
            .map_err(|_| RouteError::InvalidUri(authority.to_string()))?;

        Ok(Self {
            method: parts.method.clone(),
            uri,
            headers: rules.sanitize_request_headers(&parts.headers, host),
            body,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// A fresh outbound request for one attempt.
    pub fn build(&self) -> Request<Bytes> {
        let mut request = Request::new(self.body.clone());
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.clone();
        *request.headers_mut() = self.headers.clone();
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::UpstreamConfig;

    fn plan(request: Request<()>, body: &'static [u8]) -> ForwardPlan {
        let (parts, ()) = request.into_parts();
        let target = RoutingTarget::from_uri(&parts.uri).unwrap();
        let rules = HeaderRules::from_config(&UpstreamConfig::default()).unwrap();
        ForwardPlan::new(&parts, Bytes::from_static(body), &target, "roblox.com", &rules).unwrap()
    }

    #[test]
    fn builds_rewritten_request() {
        let inbound = Request::builder()
            .method(Method::POST)
            .uri("/friends/v1/users/1/request-friendship?src=x")
            .header("host", "proxy.local")
            .header("content-type", "application/json")
            .header("roblox-id", "7")
            .body(())
            .unwrap();

        let outbound = plan(inbound, b"{\"a\":1}").build();

        assert_eq!(outbound.method(), Method::POST);
        assert_eq!(
            outbound.uri().to_string(),
            "https://friends.roblox.com/v1/users/1/request-friendship?src=x"
        );
        assert_eq!(outbound.headers()["host"], "friends.roblox.com");
        assert_eq!(outbound.headers()["user-agent"], "RoProxy/1.0");
        assert_eq!(outbound.headers()["content-type"], "application/json");
        assert!(!outbound.headers().contains_key("roblox-id"));
        assert_eq!(outbound.body().as_ref(), b"{\"a\":1}");
    }

    #[test]
    fn every_attempt_gets_the_full_body() {
        let inbound = Request::builder()
            .method(Method::PUT)
            .uri("/apis/v1/x")
            .body(())
            .unwrap();
        let plan = plan(inbound, b"payload");

        let first = plan.build();
        drop(first);
        let second = plan.build();
        assert_eq!(second.body().as_ref(), b"payload");
    }

    #[test]
    fn empty_get_stays_empty() {
        let inbound = Request::builder().uri("/users/v1/users/1").body(()).unwrap();
        let outbound = plan(inbound, b"").build();
        assert_eq!(outbound.method(), Method::GET);
        assert!(outbound.body().is_empty());
    }
}
