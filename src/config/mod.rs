//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (loader.rs)
//!     → environment overlay: TIMEOUT, RETRIES, PORT, KEY, ... (loader.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to the request pipeline
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at start and never changes afterwards
//! - All fields have defaults so an empty environment is a working setup
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, IgnoredVar};
pub use schema::{
    AdmissionConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, RetryConfig,
    UpstreamConfig,
};
