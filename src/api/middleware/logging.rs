use axum::{
    extract::Request,
    http::{header::CONTENT_LENGTH, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, Instrument};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags the request with an id and logs when the response head is ready.
/// Streamed bodies are still in flight at that point, so `duration_ms` is the
/// time to first byte for them. Handlers record `messages` on the span.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        messages = tracing::field::Empty
    );
    let start = Instant::now();

    let mut response = next.run(request).instrument(span.clone()).await;

    let duration = start.elapsed();
    let status = response.status();
    let streaming = !response.headers().contains_key(CONTENT_LENGTH);

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    span.in_scope(|| {
        info!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            streaming,
            "Response started"
        )
    });

    response
}
