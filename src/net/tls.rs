//! TLS client configuration and certificate loading.
//!
//! A TLS policy reaches the transport as an already-built
//! `Arc<rustls::ClientConfig>`. This module builds one either from system
//! defaults or from a [`TlsPolicyConfig`] describing files on disk.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{self, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme, SupportedProtocolVersion};
use thiserror::Error;

use crate::config::schema::{TlsPolicyConfig, TlsVersion};

/// Errors raised while turning a TLS policy into a client configuration.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in {0}")]
    NoCertificates(PathBuf),

    #[error("no private key found in {0}")]
    NoPrivateKey(PathBuf),

    #[error("min_version {min} is newer than max_version {max}")]
    VersionRange { min: TlsVersion, max: TlsVersion },

    #[error("client certificate and key must be configured together")]
    IncompleteClientIdentity,

    #[error("no trust anchors configured")]
    NoTrustAnchors,

    #[error(transparent)]
    Rustls(#[from] rustls::Error),
}

/// Client configuration used when the caller supplies no TLS policy:
/// platform root store, safe default protocol versions, no client auth.
pub fn default_client_config() -> ClientConfig {
    install_crypto_provider();
    ClientConfig::builder()
        .with_root_certificates(system_roots())
        .with_no_client_auth()
}

/// Build a client configuration from a file-based policy.
pub fn build_client_config(policy: &TlsPolicyConfig) -> Result<ClientConfig, TlsError> {
    install_crypto_provider();

    let versions = protocol_versions(policy.min_version, policy.max_version)?;
    let builder = ClientConfig::builder_with_protocol_versions(&versions);

    let builder = if policy.insecure_skip_verify {
        tracing::warn!("TLS server certificate verification is disabled");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new()))
    } else {
        builder.with_root_certificates(root_store(policy)?)
    };

    let config = match (&policy.client_cert_path, &policy.client_key_path) {
        (Some(cert_path), Some(key_path)) => {
            let chain = load_certs(cert_path)?;
            let key = load_private_key(key_path)?;
            builder.with_client_auth_cert(chain, key)?
        }
        (None, None) => builder.with_no_client_auth(),
        _ => return Err(TlsError::IncompleteClientIdentity),
    };

    tracing::debug!(
        versions = ?versions.iter().map(|v| v.version).collect::<Vec<_>>(),
        client_auth = policy.client_cert_path.is_some(),
        "TLS client configuration built"
    );
    Ok(config)
}

/// Load the platform root store. Certificates that fail to load or parse
/// are logged and skipped.
pub fn system_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        tracing::warn!(error = %err, "Failed to load system root certificates");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    tracing::debug!(added, ignored, "System root certificates loaded");
    roots
}

/// Load every certificate in a PEM file.
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

/// Load the first private key in a PEM file.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(path.to_path_buf()))
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn root_store(policy: &TlsPolicyConfig) -> Result<RootCertStore, TlsError> {
    let mut roots = if policy.system_roots {
        system_roots()
    } else {
        RootCertStore::empty()
    };
    for path in &policy.ca_cert_paths {
        for cert in load_certs(path)? {
            roots.add(cert)?;
        }
    }
    if roots.is_empty() {
        return Err(TlsError::NoTrustAnchors);
    }
    Ok(roots)
}

fn protocol_versions(
    min: Option<TlsVersion>,
    max: Option<TlsVersion>,
) -> Result<Vec<&'static SupportedProtocolVersion>, TlsError> {
    let min = min.unwrap_or(TlsVersion::Tls12);
    let max = max.unwrap_or(TlsVersion::Tls13);
    if min > max {
        return Err(TlsError::VersionRange { min, max });
    }
    Ok([TlsVersion::Tls12, TlsVersion::Tls13]
        .into_iter()
        .filter(|v| (min..=max).contains(v))
        .map(|v| match v {
            TlsVersion::Tls12 => &rustls::version::TLS12,
            TlsVersion::Tls13 => &rustls::version::TLS13,
        })
        .collect())
}

// Several crates in a dependency graph may enable different rustls
// providers; pin ring unless someone already chose.
fn install_crypto_provider() {
    let _ = crypto::ring::default_provider().install_default();
}

/// Verifier that accepts any server certificate but still checks
/// handshake signatures.
#[derive(Debug)]
struct AcceptAnyServerCert(Arc<CryptoProvider>);

impl AcceptAnyServerCert {
    fn new() -> Self {
        Self(Arc::new(crypto::ring::default_provider()))
    }
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
