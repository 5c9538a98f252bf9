//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → admission.rs (shared-secret gate, 407 on mismatch)
//!     → [path translation]
//!     → headers.rs (strip hop-by-hop, force Host/User-Agent, drop relay header)
//!     → upstream
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → caller
//! ```
//!
//! # Design Decisions
//! - The gate runs before anything else and short-circuits
//! - Absent secret means the gate is open
//! - No trust in client-supplied Host or User-Agent

pub mod admission;
pub mod headers;

pub use admission::{admission_gate, AdmissionGate};
pub use headers::{is_hop_by_hop, sanitize_response_headers, HeaderRules, HOP_BY_HOP_HEADERS};
