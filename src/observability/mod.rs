//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! connector, transport, propagation, client
//!     → tracing events with structured fields
//!     → logging.rs (fmt subscriber, level from config)
//! ```

pub mod logging;

pub use logging::{try_init_logging, try_init_logging_from, LoggingError};
