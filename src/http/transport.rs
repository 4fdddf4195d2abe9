//! Transport factory.
//!
//! Builds a pooled hyper-util client over [`TimeoutConnector`]. Every call
//! returns an independent transport with its own connection pool.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::net::connector::TimeoutConnector;
use crate::net::tls::default_client_config;
use crate::resilience::timeouts::{DIAL_TIMEOUT, TLS_HANDSHAKE_TIMEOUT};

/// Pooled transport performing one HTTP exchange per request.
pub type Transport<B = Full<Bytes>> = Client<TimeoutConnector, B>;

/// Build a transport with the fixed dial and TLS handshake timeouts.
///
/// `tls` is used for every `https` handshake; `None` selects the system
/// defaults from [`default_client_config`].
pub fn new_transport_with_policy<B>(tls: Option<Arc<rustls::ClientConfig>>) -> Transport<B>
where
    B: http_body::Body + Send,
    B::Data: Send,
{
    build_transport(tls, DIAL_TIMEOUT, TLS_HANDSHAKE_TIMEOUT)
}

pub(crate) fn build_transport<B>(
    tls: Option<Arc<rustls::ClientConfig>>,
    dial_timeout: Duration,
    handshake_timeout: Duration,
) -> Transport<B>
where
    B: http_body::Body + Send,
    B::Data: Send,
{
    let custom_tls = tls.is_some();
    let tls = tls.unwrap_or_else(|| Arc::new(default_client_config()));
    let connector = TimeoutConnector::new(tls, dial_timeout, handshake_timeout);

    tracing::debug!(
        dial_timeout = ?dial_timeout,
        handshake_timeout = ?handshake_timeout,
        custom_tls,
        "Transport created"
    );

    Client::builder(TokioExecutor::new()).build(connector)
}
