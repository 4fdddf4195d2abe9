//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the HTTP client.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the traced HTTP client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Optional TLS policy. Absent means system defaults.
    pub tls: Option<TlsPolicyConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Timeout configuration for the outbound call path.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Overall request timeout (connect, send and receive headers) in seconds.
    pub request_secs: u64,

    /// TCP connection establishment timeout in seconds.
    pub dial_secs: u64,

    /// TLS handshake timeout in seconds.
    pub tls_handshake_secs: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn dial(&self) -> Duration {
        Duration::from_secs(self.dial_secs)
    }

    pub fn tls_handshake(&self) -> Duration {
        Duration::from_secs(self.tls_handshake_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 20,
            dial_secs: 5,
            tls_handshake_secs: 5,
        }
    }
}

/// TLS protocol versions a policy may pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsVersion {
    Tls12,
    Tls13,
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsVersion::Tls12 => f.write_str("TLSv1.2"),
            TlsVersion::Tls13 => f.write_str("TLSv1.3"),
        }
    }
}

/// File-based description of a client TLS policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsPolicyConfig {
    /// Trust the platform root store in addition to `ca_cert_paths`.
    pub system_roots: bool,

    /// Extra trust anchors (PEM bundles).
    pub ca_cert_paths: Vec<PathBuf>,

    /// Client certificate chain (PEM) for mutual TLS.
    pub client_cert_path: Option<PathBuf>,

    /// Private key (PEM) matching `client_cert_path`.
    pub client_key_path: Option<PathBuf>,

    /// Lowest protocol version offered. Defaults to TLS 1.2.
    pub min_version: Option<TlsVersion>,

    /// Highest protocol version offered. Defaults to TLS 1.3.
    pub max_version: Option<TlsVersion>,

    /// Skip server certificate verification. Testing only.
    pub insecure_skip_verify: bool,
}

impl Default for TlsPolicyConfig {
    fn default() -> Self {
        Self {
            system_roots: true,
            ca_cert_paths: Vec::new(),
            client_cert_path: None,
            client_key_path: None,
            min_version: None,
            max_version: None,
            insecure_skip_verify: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info" or "traced_http_client=debug").
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
