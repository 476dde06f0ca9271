// ABOUTME: Request tracing middleware for correlation and structured logging
// ABOUTME: Request ID generation plus the span and completion hooks used by the HTTP trace layer

use std::time::Duration;

use axum::http::{HeaderName, Request, Response};
use tower_http::request_id::{MakeRequestId, RequestId};
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::{field, info, info_span, Span};
use uuid::Uuid;

/// Header carrying the request correlation id
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Generates `req_<uuid>` ids for requests that arrive without one
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        format!("req_{}", Uuid::new_v4().simple())
            .parse()
            .ok()
            .map(RequestId::new)
    }
}

/// Create a tracing span for an HTTP request
pub fn create_request_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
        status_code = field::Empty,
        duration_ms = field::Empty,
    )
}

/// Span factory for `TraceLayer`
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        create_request_span(request)
    }
}

/// Records status and latency on the request span
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordResponse;

impl<B> OnResponse<B> for RecordResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status().as_u16();
        let duration_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        span.record("status_code", status);
        span.record("duration_ms", duration_ms);
        info!(status, duration_ms, "Request completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_request_ids_are_unique() {
        let request = Request::new(());
        let mut maker = MakeRequestUuid;
        let first = maker.make_request_id(&request).unwrap();
        let second = maker.make_request_id(&request).unwrap();

        let first = first.header_value().to_str().unwrap().to_owned();
        assert!(first.starts_with("req_"));
        assert_ne!(first, second.header_value().to_str().unwrap());
    }
}
