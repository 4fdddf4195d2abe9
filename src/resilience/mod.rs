//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (overall request deadline, carried into the body)
//!     → net::connector (dial and TLS handshake deadlines)
//!     → failure surfaces to the caller unchanged, never retried here
//! ```

pub mod timeouts;

pub use timeouts::{with_deadline, Deadline, DIAL_TIMEOUT, REQUEST_TIMEOUT, TLS_HANDSHAKE_TIMEOUT};
