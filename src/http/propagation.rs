//! Trace context propagation for outbound requests.
//!
//! # Responsibilities
//! - Find the span context attached to a request
//! - Serialize it into the request headers through a propagator
//! - Forward the request to the wrapped service untouched otherwise
//!
//! # Design Decisions
//! - The span context travels in the request's `Extensions` as an
//!   `opentelemetry::Context`; nothing is read from thread-local or global state
//! - The propagator is handed in at construction time
//! - The wrapped service's future is returned as-is, so responses and
//!   errors pass through unchanged

use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use http::Request;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;
use opentelemetry_http::HeaderInjector;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tower::{Layer, Service};

/// Tracing capability shared by every request a client sends.
pub type SharedPropagator = Arc<dyn TextMapPropagator + Send + Sync>;

/// W3C `traceparent`/`tracestate` propagator.
pub fn default_propagator() -> SharedPropagator {
    Arc::new(TraceContextPropagator::new())
}

/// Extension trait for attaching a trace context to a request.
pub trait RequestContextExt {
    /// Attach `cx`, replacing any context already present.
    fn with_trace_context(self, cx: Context) -> Self;

    /// Attach `cx`, returning the previous context.
    fn set_trace_context(&mut self, cx: Context) -> Option<Context>;

    /// The attached context, if any.
    fn trace_context(&self) -> Option<&Context>;
}

impl<B> RequestContextExt for Request<B> {
    fn with_trace_context(mut self, cx: Context) -> Self {
        self.set_trace_context(cx);
        self
    }

    fn set_trace_context(&mut self, cx: Context) -> Option<Context> {
        self.extensions_mut().insert(cx)
    }

    fn trace_context(&self) -> Option<&Context> {
        self.extensions().get::<Context>()
    }
}

/// Write the request's span context into its headers.
///
/// Returns `true` when a valid span context was found and handed to the
/// propagator. Requests without one are left untouched.
pub fn inject_trace_context<B>(propagator: &dyn TextMapPropagator, req: &mut Request<B>) -> bool {
    let cx = match req.trace_context() {
        Some(cx) if cx.span().span_context().is_valid() => cx.clone(),
        _ => return false,
    };

    let before = req.headers().len();
    propagator.inject_context(&cx, &mut HeaderInjector(req.headers_mut()));

    let span = cx.span();
    let span_context = span.span_context();
    if req.headers().len() == before {
        tracing::debug!(
            trace_id = %span_context.trace_id(),
            "Propagator added no headers"
        );
    } else {
        tracing::trace!(
            trace_id = %span_context.trace_id(),
            span_id = %span_context.span_id(),
            "Injected trace context"
        );
    }
    true
}

/// Layer that wraps a service with [`TraceContext`].
#[derive(Clone, Debug)]
pub struct TraceContextLayer {
    propagator: SharedPropagator,
}

impl TraceContextLayer {
    pub fn new(propagator: SharedPropagator) -> Self {
        Self { propagator }
    }
}

impl Default for TraceContextLayer {
    fn default() -> Self {
        Self::new(default_propagator())
    }
}

impl<S> Layer<S> for TraceContextLayer {
    type Service = TraceContext<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceContext::new(inner, self.propagator.clone())
    }
}

/// Service that injects trace context headers before delegating.
#[derive(Clone, Debug)]
pub struct TraceContext<S> {
    inner: S,
    propagator: SharedPropagator,
}

impl<S> TraceContext<S> {
    pub fn new(inner: S, propagator: SharedPropagator) -> Self {
        Self { inner, propagator }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, B> Service<Request<B>> for TraceContext<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        inject_trace_context(self.propagator.as_ref(), &mut req);
        self.inner.call(req)
    }
}
