//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request-target ("/games/v1/games?universeIds=1")
//!     → target.rs (strip one '/', split on the first '/')
//!     → RoutingTarget { subdomain: "games", remainder: "v1/games?universeIds=1" }
//!     → https://games.{upstream-domain}/v1/games?universeIds=1
//! ```
//!
//! # Design Decisions
//! - There is no routing table: the first path segment *is* the route
//! - Parsing is a pure function of the request-target string
//! - Query strings ride along with the remainder untouched

pub mod target;

pub use target::{RouteError, RoutingTarget};
