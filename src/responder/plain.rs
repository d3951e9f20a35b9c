//! Plain filler responses.

use axum::body::Body;
use axum::response::Response;
use http::request::Parts;
use http::StatusCode;

use super::{filler_header, to_len, Responder, CHAFF_HEADER};
use crate::error::Result;
use crate::random::random_data;

/// Writes base64 filler into the `X-Chaff` header and the raw body.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainResponder;

impl Responder for PlainResponder {
    fn render(&self, header_size: u64, body_size: u64, _request: &Parts) -> Result<Response> {
        let mut builder = Response::builder().status(StatusCode::OK);
        if let Some(value) = filler_header(header_size)? {
            builder = builder.header(CHAFF_HEADER, value);
        }

        let body = if body_size > 0 {
            Body::from(random_data(to_len(body_size)))
        } else {
            Body::empty()
        };

        Ok(builder.body(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn parts() -> Parts {
        Request::get("/").body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_plain_shape() {
        let response = PlainResponder.render(100, 250, &parts()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let header = response.headers().get(CHAFF_HEADER).unwrap();
        assert_eq!(header.len(), 100);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!((248..=252).contains(&body.len()));
    }

    #[tokio::test]
    async fn test_plain_empty_profile() {
        let response = PlainResponder.render(0, 0, &parts()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CHAFF_HEADER).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}
