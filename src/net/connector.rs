//! Outbound connector with separate dial and TLS handshake deadlines.
//!
//! # Responsibilities
//! - Resolve and dial TCP under one dial deadline
//! - Run the TLS handshake for `https` URIs under its own deadline
//! - Hand hyper-util a stream it can pool and reuse
//!
//! # Design Decisions
//! - The dial deadline wraps resolution and connect; `HttpConnector` also
//!   applies it per connect attempt
//! - The handshake deadline starts after the socket is connected
//! - Plain `http` URIs skip TLS entirely

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use http::uri::Scheme;
use http::Uri;
use hyper_rustls::MaybeHttpsStream;
use hyper_util::client::legacy::connect::dns::GaiResolver;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tower::Service;

use crate::error::BoxError;

/// Stream produced by [`TimeoutConnector`].
pub type ConnectorStream = MaybeHttpsStream<TokioIo<TcpStream>>;

/// Errors raised while establishing a connection.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("dial failed: {0}")]
    Dial(#[source] BoxError),

    #[error("dial timed out after {0:?}")]
    DialTimeout(Duration),

    #[error("uri {0} has no host")]
    MissingHost(Uri),

    #[error("invalid TLS server name {0:?}")]
    InvalidServerName(String),

    #[error("TLS handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),
}

/// Connector enforcing a dial timeout and a TLS handshake timeout.
///
/// The dial budget covers name resolution and the TCP connect together.
#[derive(Clone)]
pub struct TimeoutConnector<R = GaiResolver> {
    http: HttpConnector<R>,
    tls: TlsConnector,
    dial_timeout: Duration,
    handshake_timeout: Duration,
}

impl TimeoutConnector {
    /// Create a connector using `tls` for every `https` destination.
    pub fn new(tls: Arc<rustls::ClientConfig>, dial_timeout: Duration, handshake_timeout: Duration) -> Self {
        Self::with_resolver(GaiResolver::new(), tls, dial_timeout, handshake_timeout)
    }
}

impl<R> TimeoutConnector<R> {
    /// Create a connector resolving names through `resolver`.
    pub fn with_resolver(
        resolver: R,
        tls: Arc<rustls::ClientConfig>,
        dial_timeout: Duration,
        handshake_timeout: Duration,
    ) -> Self {
        let mut http = HttpConnector::new_with_resolver(resolver);
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_connect_timeout(Some(dial_timeout));

        Self {
            http,
            tls: TlsConnector::from(tls),
            dial_timeout,
            handshake_timeout,
        }
    }

    /// The TLS configuration presented on handshakes.
    pub fn tls_config(&self) -> &Arc<rustls::ClientConfig> {
        self.tls.config()
    }

    pub fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }

    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }
}

impl<R> std::fmt::Debug for TimeoutConnector<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutConnector")
            .field("dial_timeout", &self.dial_timeout)
            .field("handshake_timeout", &self.handshake_timeout)
            .finish_non_exhaustive()
    }
}

impl<R> Service<Uri> for TimeoutConnector<R>
where
    HttpConnector<R>: Service<Uri, Response = TokioIo<TcpStream>>,
    <HttpConnector<R> as Service<Uri>>::Error: Into<BoxError>,
    <HttpConnector<R> as Service<Uri>>::Future: Send + 'static,
{
    type Response = ConnectorStream;
    type Error = ConnectorError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.http
            .poll_ready(cx)
            .map_err(|e| ConnectorError::Dial(e.into()))
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let https = dst.scheme() == Some(&Scheme::HTTPS);
        let dialing = self.http.call(dst.clone());
        let tls = self.tls.clone();
        let dial_timeout = self.dial_timeout;
        let handshake_timeout = self.handshake_timeout;

        Box::pin(async move {
            let tcp = match tokio::time::timeout(dial_timeout, dialing).await {
                Ok(Ok(tcp)) => tcp,
                Ok(Err(e)) => return Err(ConnectorError::Dial(e.into())),
                Err(_) => {
                    tracing::warn!(uri = %dst, timeout = ?dial_timeout, "Dial timed out");
                    return Err(ConnectorError::DialTimeout(dial_timeout));
                }
            };
            if !https {
                return Ok(MaybeHttpsStream::Http(tcp));
            }

            let server_name = server_name(&dst)?;
            let handshake = tls.connect(server_name, TokioIo::new(tcp));
            match tokio::time::timeout(handshake_timeout, handshake).await {
                Ok(Ok(stream)) => Ok(MaybeHttpsStream::Https(TokioIo::new(stream))),
                Ok(Err(e)) => Err(ConnectorError::Handshake(e)),
                Err(_) => {
                    tracing::warn!(
                        uri = %dst,
                        timeout = ?handshake_timeout,
                        "TLS handshake timed out"
                    );
                    Err(ConnectorError::HandshakeTimeout(handshake_timeout))
                }
            }
        })
    }
}

fn server_name(dst: &Uri) -> Result<ServerName<'static>, ConnectorError> {
    let host = dst
        .host()
        .ok_or_else(|| ConnectorError::MissingHost(dst.clone()))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    ServerName::try_from(host.to_owned())
        .map_err(|_| ConnectorError::InvalidServerName(host.to_owned()))
}
