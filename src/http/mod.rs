//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, admission gate, handler)
//!     → [routing::target translates the request-target]
//!     → request.rs (ForwardPlan: buffered body, sanitized headers)
//!     → [resilience::retries drives attempts]
//!     → client.rs (TLS upstream call, per-call timeout)
//!     → response.rs (relay or fixed local response)
//!     → Send to client
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use client::{HttpsUpstream, UpstreamClient, UpstreamError};
pub use request::ForwardPlan;
pub use server::{AppState, HttpServer, ServerError};
