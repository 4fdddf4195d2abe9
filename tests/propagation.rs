//! Behaviour of the trace context decorator around an arbitrary transport.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};
use opentelemetry::Context;
use opentelemetry_http::HeaderExtractor;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tower::{service_fn, Layer, Service, ServiceExt};
use traced_http_client::http::propagation::default_propagator;
use traced_http_client::{RequestContextExt, TraceContext, TraceContextLayer};

fn span_context(trace_id: u128) -> SpanContext {
    SpanContext::new(
        TraceId::from_bytes(trace_id.to_be_bytes()),
        SpanId::from_bytes(0xabcdu64.to_be_bytes()),
        TraceFlags::SAMPLED,
        true,
        TraceState::default(),
    )
}

fn context_with_trace(trace_id: u128) -> Context {
    Context::new().with_remote_span_context(span_context(trace_id))
}

/// Transport double that records the headers of every request it receives.
fn recording_transport(
    seen: Arc<Mutex<Vec<HeaderMap>>>,
) -> impl Service<Request<()>, Response = Response<&'static str>, Error = Infallible, Future: Send> + Clone + Send + 'static {
    service_fn(move |req: Request<()>| {
        let seen = seen.clone();
        async move {
            seen.lock().unwrap().push(req.headers().clone());
            Ok::<_, Infallible>(Response::new("ok"))
        }
    })
}

fn caller_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("accept", HeaderValue::from_static("application/json"));
    headers.insert("x-request-id", HeaderValue::from_static("req-1"));
    headers
}

#[tokio::test]
async fn request_without_span_is_forwarded_unmodified() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let svc = TraceContextLayer::default().layer(recording_transport(seen.clone()));

    let mut req = Request::new(());
    *req.headers_mut() = caller_headers();
    svc.oneshot(req).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], caller_headers());
    assert!(!seen[0].contains_key("traceparent"));
}

#[tokio::test]
async fn context_without_active_span_is_forwarded_unmodified() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let svc = TraceContextLayer::default().layer(recording_transport(seen.clone()));

    let mut req = Request::new(()).with_trace_context(Context::new());
    *req.headers_mut() = caller_headers();
    svc.oneshot(req).await.unwrap();

    assert_eq!(seen.lock().unwrap()[0], caller_headers());
}

#[tokio::test]
async fn active_span_round_trips_through_headers() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let svc = TraceContextLayer::default().layer(recording_transport(seen.clone()));

    let mut req = Request::new(()).with_trace_context(context_with_trace(42));
    *req.headers_mut() = caller_headers();
    svc.oneshot(req).await.unwrap();

    let headers = seen.lock().unwrap()[0].clone();
    assert_eq!(headers["accept"], "application/json");
    assert_eq!(headers["x-request-id"], "req-1");
    assert!(headers["traceparent"]
        .to_str()
        .unwrap()
        .starts_with("00-0000000000000000000000000000002a-"));

    let extracted = TraceContextPropagator::new().extract(&HeaderExtractor(&headers));
    let extracted = extracted.span().span_context().clone();
    let expected = span_context(42);
    assert_eq!(extracted.trace_id(), expected.trace_id());
    assert_eq!(extracted.span_id(), expected.span_id());
    assert_eq!(extracted.trace_flags(), expected.trace_flags());
}

#[tokio::test]
async fn response_passes_through_unchanged() {
    let transport = service_fn(|_req: Request<()>| async {
        let response = Response::builder()
            .status(StatusCode::IM_A_TEAPOT)
            .header("x-backend", "b1")
            .body("short and stout")
            .unwrap();
        Ok::<_, Infallible>(response)
    });
    let svc = TraceContext::new(transport, default_propagator());

    let req = Request::new(()).with_trace_context(context_with_trace(1));
    let response = svc.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.headers()["x-backend"], "b1");
    assert_eq!(*response.body(), "short and stout");
}

#[tokio::test]
async fn failure_passes_through_unchanged() {
    #[derive(Debug, PartialEq)]
    struct Refused(&'static str);

    let transport = service_fn(|_req: Request<()>| async { Err::<Response<()>, _>(Refused("connection refused")) });
    let svc = TraceContext::new(transport, default_propagator());

    let with_span = Request::new(()).with_trace_context(context_with_trace(9));
    assert_eq!(
        svc.clone().oneshot(with_span).await.unwrap_err(),
        Refused("connection refused")
    );
    assert_eq!(
        svc.oneshot(Request::new(())).await.unwrap_err(),
        Refused("connection refused")
    );
}

#[tokio::test]
async fn explicit_propagator_controls_encoding() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let silent = TextMapCompositePropagator::new(Vec::new());
    let svc = TraceContext::new(recording_transport(seen.clone()), Arc::new(silent));

    let req = Request::new(()).with_trace_context(context_with_trace(42));
    svc.oneshot(req).await.unwrap();

    assert!(seen.lock().unwrap()[0].is_empty());
}

#[tokio::test]
async fn concurrent_requests_do_not_interfere() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let svc = TraceContextLayer::default().layer(recording_transport(seen.clone()));

    let tasks: Vec<_> = (1..=64u128)
        .map(|trace_id| {
            let svc = svc.clone();
            tokio::spawn(async move {
                let mut req = Request::new(());
                if trace_id % 2 == 0 {
                    req.set_trace_context(context_with_trace(trace_id));
                }
                req.headers_mut().insert(
                    "x-expected",
                    HeaderValue::from_str(&trace_id.to_string()).unwrap(),
                );
                svc.oneshot(req).await.unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 64);
    let propagator = TraceContextPropagator::new();
    for headers in seen.iter() {
        let expected: u128 = headers["x-expected"].to_str().unwrap().parse().unwrap();
        if expected % 2 == 0 {
            let cx = propagator.extract(&HeaderExtractor(headers));
            assert_eq!(
                cx.span().span_context().trace_id(),
                TraceId::from_bytes(expected.to_be_bytes())
            );
        } else {
            assert!(!headers.contains_key("traceparent"));
        }
    }
}
