//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! HttpClient::request
//!     → resilience::timeouts (overall deadline)
//!     → propagation.rs (span context from extensions → headers)
//!     → transport.rs (pooled hyper-util client)
//!     → net::connector (dial, TLS handshake)
//!     → Response or failure, returned unchanged
//!     → body.rs (body reads bounded by the same deadline)
//! ```

pub mod body;
pub mod client;
pub mod propagation;
pub mod transport;

pub use body::TimedBody;
pub use client::{new_client_with_tls_policy, new_default_client, ClientBuilder, HttpClient};
pub use propagation::{
    default_propagator, inject_trace_context, RequestContextExt, SharedPropagator, TraceContext,
    TraceContextLayer,
};
pub use transport::{new_transport_with_policy, Transport};
