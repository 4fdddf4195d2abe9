//! HTTP client with bounded timeouts and distributed trace propagation.
//!
//! ```text
//!   HttpClient ── request timeout (20s), through to the end of the body
//!       │
//!       ▼
//!   TraceContext ── span context in request extensions → traceparent headers
//!       │
//!       ▼
//!   Transport (hyper-util pool)
//!       │
//!       ▼
//!   TimeoutConnector ── dial (5s), TLS handshake (5s)
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::HttpClientConfig;
pub use error::ClientError;
pub use self::http::{
    new_client_with_tls_policy, new_default_client, new_transport_with_policy, ClientBuilder, HttpClient,
    RequestContextExt, TimedBody, TraceContext, TraceContextLayer, Transport,
};
