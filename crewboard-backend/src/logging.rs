//! Logging things
//!
//! Every request gets a span carrying its method, path and a fresh request id,
//! the response fills in status, latency and size.

use std::time::Duration;

use axum::{http::header::CONTENT_LENGTH, response::Response};
use tower_http::{
    classify::{ServerErrorsAsFailures, ServerErrorsFailureClass, SharedClassifier},
    trace::{OnFailure, OnRequest, OnResponse, TraceLayer},
};
use tracing::{error, trace, warn, Span};
use uuid::Uuid;

#[derive(Copy, Clone)]
pub(crate) struct RequestSpanner {}

impl<B> tower_http::trace::MakeSpan<B> for RequestSpanner {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        tracing::info_span!(
            "request",
            request_id = %Uuid::new_v4(),
            method = %request.method(),
            path = %request.uri().path(),
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
            bytes = tracing::field::Empty
        )
    }
}

impl<B> OnRequest<B> for RequestSpanner {
    fn on_request(&mut self, _request: &axum::http::Request<B>, _span: &Span) {
        trace!("request received");
    }
}

impl<B> OnResponse<B> for RequestSpanner {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status();
        span.record("status", status.as_u16());
        span.record("latency_ms", latency.as_millis() as u64);
        if let Some(content_length) = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
        {
            span.record("bytes", content_length);
        }
        if status.is_client_error() {
            warn!("response sent");
        } else {
            tracing::event!(tracing::Level::INFO, "response sent");
        }
    }
}

impl OnFailure<ServerErrorsFailureClass> for RequestSpanner {
    fn on_failure(&mut self, failure: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
        error!(
            latency_ms = latency.as_millis() as u64,
            "request failed: {}", failure
        );
    }
}

pub(crate) fn logging_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    RequestSpanner,
    RequestSpanner,
    RequestSpanner,
    tower_http::trace::DefaultOnBodyChunk,
    tower_http::trace::DefaultOnEos,
    RequestSpanner,
> {
    TraceLayer::new_for_http()
        .on_request(RequestSpanner {})
        .make_span_with(RequestSpanner {})
        .on_response(RequestSpanner {})
        .on_failure(RequestSpanner {})
}
