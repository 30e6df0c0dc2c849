use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::{
    global,
    trace::{Span, SpanKind, Status, Tracer},
    KeyValue,
};
use std::time::Instant;
use tracing::{field, info_span, Instrument};

/// Opens an OpenTelemetry server span and a `tracing` span per request. The
/// `tracing` span carries a request id, and `user_id` once the actor is known.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let request_id = uuid::Uuid::now_v7();

    let tracer = global::tracer("microcourses-http");
    let mut otel_span = tracer
        .span_builder(format!("{method} {route}"))
        .with_kind(SpanKind::Server)
        .with_attributes([
            KeyValue::new("http.method", method.to_string()),
            KeyValue::new("http.route", route.clone()),
            KeyValue::new("request.id", request_id.to_string()),
        ])
        .start(&tracer);

    let span = info_span!(
        "http_request",
        %method,
        %route,
        %request_id,
        user_id = field::Empty,
    );

    let response = next.run(request).instrument(span.clone()).await;
    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;

    otel_span.set_attribute(KeyValue::new("http.status_code", i64::from(status.as_u16())));
    if status.is_server_error() {
        otel_span.set_status(Status::error(format!("HTTP {}", status.as_u16())));
    }
    otel_span.end();

    span.in_scope(|| {
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), latency_ms, "Request failed");
        } else {
            tracing::info!(status = status.as_u16(), latency_ms, "Request completed");
        }
    });

    response
}
