//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging/metrics → Build client → Bind → Serve
//!
//! Shutdown (signals.rs):
//!     SIGINT/SIGTERM → stop accepting → drain in-flight requests → exit
//! ```

pub mod signals;

pub use signals::shutdown_signal;
