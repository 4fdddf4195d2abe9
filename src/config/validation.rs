//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and combinations
//! that only make sense together. All problems are reported at once.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::{HttpClientConfig, TlsPolicyConfig, TlsVersion};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.{0} must not exceed timeouts.request_secs")]
    ExceedsRequestTimeout(&'static str),

    #[error("tls.min_version {min} is newer than tls.max_version {max}")]
    VersionRange { min: TlsVersion, max: TlsVersion },

    #[error("tls.client_cert_path and tls.client_key_path must be set together")]
    IncompleteClientIdentity,

    #[error("tls has no trust anchors: enable system_roots or list ca_cert_paths")]
    NoTrustAnchors,

    #[error("observability.log_level {0:?} is not a valid filter")]
    InvalidLogLevel(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &HttpClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let timeouts = &config.timeouts;
    for (name, secs) in [
        ("request_secs", timeouts.request_secs),
        ("dial_secs", timeouts.dial_secs),
        ("tls_handshake_secs", timeouts.tls_handshake_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }
    if timeouts.dial_secs > timeouts.request_secs {
        errors.push(ValidationError::ExceedsRequestTimeout("dial_secs"));
    }
    if timeouts.tls_handshake_secs > timeouts.request_secs {
        errors.push(ValidationError::ExceedsRequestTimeout("tls_handshake_secs"));
    }

    if let Some(tls) = &config.tls {
        validate_tls(tls, &mut errors);
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_tls(tls: &TlsPolicyConfig, errors: &mut Vec<ValidationError>) {
    if let (Some(min), Some(max)) = (tls.min_version, tls.max_version) {
        if min > max {
            errors.push(ValidationError::VersionRange { min, max });
        }
    }
    if tls.client_cert_path.is_some() != tls.client_key_path.is_some() {
        errors.push(ValidationError::IncompleteClientIdentity);
    }
    if !tls.insecure_skip_verify && !tls.system_roots && tls.ca_cert_paths.is_empty() {
        errors.push(ValidationError::NoTrustAnchors);
    }
}
