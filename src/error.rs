//! Error taxonomy for the client call path.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

use crate::net::connector::ConnectorError;

/// Boxed error used at service boundaries.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Failure returned by [`HttpClient`](crate::HttpClient).
///
/// Nothing here is retried internally; the caller owns retry policy.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The overall request deadline expired.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Any failure from the underlying transport, passed through unchanged.
    #[error(transparent)]
    Transport(#[from] hyper_util::client::legacy::Error),

    /// Reading the response body failed.
    #[error("failed to read response body: {0}")]
    Body(#[source] hyper::Error),

    /// A convenience method could not build the request.
    #[error("invalid request: {0}")]
    Build(#[from] http::Error),
}

impl ClientError {
    /// True for the overall deadline, a dial timeout, or a TLS handshake
    /// timeout.
    pub fn is_timeout(&self) -> bool {
        chain_has_timeout(self)
    }

    /// True when no connection could be established.
    pub fn is_connect(&self) -> bool {
        matches!(self, ClientError::Transport(e) if e.is_connect())
    }
}

fn chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(err) = source {
        if matches!(err.downcast_ref::<ClientError>(), Some(ClientError::Timeout(_)))
            || matches!(
                err.downcast_ref::<ConnectorError>(),
                Some(ConnectorError::DialTimeout(_) | ConnectorError::HandshakeTimeout(_))
            )
        {
            return true;
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = err.source();
    }
    false
}
