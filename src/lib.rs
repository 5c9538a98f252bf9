//! Subdomain-routing reverse proxy library.
//!
//! `GET /{subdomain}/{path}?{query}` is forwarded to
//! `https://{subdomain}.{upstream-domain}/{path}?{query}` with bounded
//! retries, and the upstream response is relayed back.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
