//! Real-traffic instrumentation and chaff serving.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::request::Parts;
use http::{HeaderMap, StatusCode};

use super::counting::CountingBody;
use crate::detector::Detector;
use crate::profile::{Sample, Tracker};
use crate::responder::RenderFailed;

/// Tracker and detector pair for single-endpoint mode.
#[derive(Clone)]
pub struct ChaffGate {
    tracker: Arc<Tracker>,
    detector: Arc<dyn Detector>,
}

impl ChaffGate {
    /// Create a gate routing detected chaff to `tracker`'s responder.
    pub fn new(tracker: Arc<Tracker>, detector: impl Detector + 'static) -> Self {
        Self {
            tracker,
            detector: Arc::new(detector),
        }
    }

    /// Tracker behind this gate.
    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }
}

/// Middleware recording the latency and size of every response.
///
/// Responses pass through unchanged.
pub async fn track(State(tracker): State<Arc<Tracker>>, request: Request, next: Next) -> Response {
    forward_tracked(tracker, request, next).await
}

/// Middleware answering detected chaff directly and tracking everything else.
pub async fn track_or_chaff(
    State(gate): State<ChaffGate>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    if gate.detector.is_chaff(&parts) {
        return serve_chaff(&gate.tracker, &parts).await;
    }
    forward_tracked(gate.tracker, Request::from_parts(parts, body), next).await
}

/// Handler for a dedicated chaff endpoint.
pub async fn chaff(State(tracker): State<Arc<Tracker>>, request: Request) -> Response {
    let (parts, _) = request.into_parts();
    serve_chaff(&tracker, &parts).await
}

/// Render a chaff response shaped like the current profile.
///
/// Returns no sooner than the profile's mean latency after it was called. A
/// render error is logged and answered with an empty 200. Failures the
/// responder answers itself ([`RenderFailed`]) are passed through. Both kinds
/// are counted as render failures.
pub async fn serve_chaff(tracker: &Tracker, request: &Parts) -> Response {
    let start = Instant::now();
    let profile = tracker.snapshot();

    let response = match tracker
        .responder()
        .render(profile.header_size, profile.body_size, request)
    {
        Ok(response) => {
            if response.extensions().get::<RenderFailed>().is_some() {
                tracker.metrics().increment_render_failures();
            }
            response
        }
        Err(e) => {
            tracing::error!("chaff request failed to render: {}", e);
            tracker.metrics().increment_render_failures();
            StatusCode::OK.into_response()
        }
    };
    tracker.metrics().increment_chaff_served();

    normalize_latency(start, profile.latency()).await;
    response
}

/// Sleep until `target` has passed since `start`. Never shortens an overrun.
async fn normalize_latency(start: Instant, target: Duration) {
    if let Some(remaining) = target.checked_sub(start.elapsed()) {
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
    }
}

async fn forward_tracked(tracker: Arc<Tracker>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    let latency = start.elapsed();
    let header_size = header_size(response.headers());

    let (parts, body) = response.into_parts();
    let body = CountingBody::new(body).on_complete(move |body_size| {
        tracker.enqueue(Sample::from_elapsed(latency, header_size, body_size));
    });

    Response::from_parts(parts, Body::new(body))
}

/// Total bytes of header names and values, counting every value.
///
/// Framing headers (`content-length`, `transfer-encoding`) are skipped: they
/// are filled in by the router or the connection, not by the handler.
pub fn header_size(headers: &HeaderMap) -> u64 {
    headers
        .iter()
        .filter(|(name, _)| *name != CONTENT_LENGTH && *name != TRANSFER_ENCODING)
        .map(|(name, value)| (name.as_str().len() + value.len()) as u64)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_header_size() {
        let mut headers = HeaderMap::new();
        assert_eq!(header_size(&headers), 0);

        headers.insert("padding", HeaderValue::from_static("aaaa"));
        assert_eq!(header_size(&headers), 11);

        headers.append("padding", HeaderValue::from_static("bb"));
        assert_eq!(header_size(&headers), 20);

        headers.insert(http::header::CONTENT_LENGTH, HeaderValue::from_static("6"));
        assert_eq!(header_size(&headers), 20);
    }

    #[tokio::test]
    async fn test_normalize_latency_floor() {
        let start = Instant::now();
        normalize_latency(start, Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_normalize_latency_overrun() {
        let start = Instant::now() - Duration::from_millis(50);
        let before = Instant::now();
        normalize_latency(start, Duration::from_millis(10)).await;
        assert!(before.elapsed() < Duration::from_millis(10));
    }
}
