//! Client assembly.
//!
//! # Responsibilities
//! - Build the transport and wrap it with trace context propagation
//! - Bound every request, body read included, by the overall request timeout
//! - Offer the no-TLS-policy and custom-TLS-policy constructors
//!
//! # Design Decisions
//! - Clients share nothing with each other; clones share one connection pool
//! - The tracing propagator is explicit, never a process-wide global

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{Request, Response, Uri};
use http_body_util::Full;
use opentelemetry::propagation::TextMapPropagator;
use tower::{Layer, Service, ServiceExt};

use crate::config::schema::HttpClientConfig;
use crate::error::{BoxError, ClientError};
use crate::http::body::TimedBody;
use crate::http::propagation::{default_propagator, SharedPropagator, TraceContext, TraceContextLayer};
use crate::http::transport::{build_transport, Transport};
use crate::net::tls::{build_client_config, TlsError};
use crate::resilience::timeouts::{Deadline, DIAL_TIMEOUT, REQUEST_TIMEOUT, TLS_HANDSHAKE_TIMEOUT};

/// Client with system TLS defaults and W3C trace context propagation.
pub fn new_default_client() -> HttpClient {
    ClientBuilder::new().build()
}

/// Client whose handshakes use `tls`.
pub fn new_client_with_tls_policy(tls: Arc<rustls::ClientConfig>) -> HttpClient {
    ClientBuilder::new().tls_config(tls).build()
}

/// Builder for [`HttpClient`].
#[derive(Clone, Debug)]
pub struct ClientBuilder {
    tls: Option<Arc<rustls::ClientConfig>>,
    propagator: SharedPropagator,
    request_timeout: Duration,
    dial_timeout: Duration,
    tls_handshake_timeout: Duration,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            tls: None,
            propagator: default_propagator(),
            request_timeout: REQUEST_TIMEOUT,
            dial_timeout: DIAL_TIMEOUT,
            tls_handshake_timeout: TLS_HANDSHAKE_TIMEOUT,
        }
    }

    /// Start from a loaded configuration. TLS material is read from disk here.
    pub fn from_config(config: &HttpClientConfig) -> Result<Self, TlsError> {
        let tls = config
            .tls
            .as_ref()
            .map(build_client_config)
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            tls,
            request_timeout: config.timeouts.request(),
            dial_timeout: config.timeouts.dial(),
            tls_handshake_timeout: config.timeouts.tls_handshake(),
            ..Self::new()
        })
    }

    pub fn tls_config(mut self, tls: Arc<rustls::ClientConfig>) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Replace the W3C propagator.
    pub fn propagator<P>(mut self, propagator: P) -> Self
    where
        P: TextMapPropagator + Send + Sync + 'static,
    {
        self.propagator = Arc::new(propagator);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    pub fn tls_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.tls_handshake_timeout = timeout;
        self
    }

    pub fn build<B>(self) -> HttpClient<B>
    where
        B: http_body::Body + Send,
        B::Data: Send,
    {
        let transport = build_transport(self.tls, self.dial_timeout, self.tls_handshake_timeout);
        HttpClient {
            inner: TraceContextLayer::new(self.propagator).layer(transport),
            request_timeout: self.request_timeout,
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client with trace context propagation and an overall request timeout.
pub struct HttpClient<B = Full<Bytes>> {
    inner: TraceContext<Transport<B>>,
    request_timeout: Duration,
}

impl<B> HttpClient<B>
where
    B: http_body::Body + Send + Unpin + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    /// Send `req`, returning once response headers arrive.
    ///
    /// The returned body shares the request's deadline: reading it fails
    /// with [`ClientError::Timeout`] once the overall timeout has elapsed
    /// since the request started.
    ///
    /// Attach a span with
    /// [`RequestContextExt`](crate::http::propagation::RequestContextExt) to
    /// propagate it.
    pub async fn request(&self, req: Request<B>) -> Result<Response<TimedBody>, ClientError> {
        let method = req.method().clone();
        let uri = req.uri().clone();

        let deadline = Deadline::after(self.request_timeout);
        let result = deadline
            .run(self.inner.clone().oneshot(req))
            .await
            .map(|response| response.map(|body| TimedBody::new(body, deadline)));
        match &result {
            Ok(response) => {
                tracing::debug!(%method, %uri, status = %response.status(), "Request completed")
            }
            Err(e) => tracing::debug!(%method, %uri, error = %e, "Request failed"),
        }
        result
    }
}

impl<B> HttpClient<B> {
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl HttpClient<Full<Bytes>> {
    /// Send a GET request with an empty body.
    pub async fn get(&self, uri: Uri) -> Result<Response<TimedBody>, ClientError> {
        let req = Request::get(uri).body(Full::default())?;
        self.request(req).await
    }
}

impl<B> Clone for HttpClient<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<B> fmt::Debug for HttpClient<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl<B> Service<Request<B>> for HttpClient<B>
where
    B: http_body::Body + Send + Unpin + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = Response<TimedBody>;
    type Error = ClientError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.request(req).await })
    }
}
