//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request URI
//!     → connector.rs (TCP dial with connect timeout)
//!     → connector.rs (TLS handshake with its own timeout, https only)
//!     → pooled by hyper-util, reused across requests
//!
//! TLS policy:
//!     tls.rs (system defaults, or PEM files from config)
//!     → Arc<rustls::ClientConfig> shared by every handshake
//! ```

pub mod connector;
pub mod tls;

pub use connector::{ConnectorError, ConnectorStream, TimeoutConnector};
pub use tls::{build_client_config, default_client_config, TlsError};
