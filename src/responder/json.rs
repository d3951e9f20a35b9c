//! JSON filler responses.
//!
//! The random payload is handed to a caller-supplied function that wraps it
//! in whatever document the real API returns. Fixed overhead is subtracted
//! from the targets so the emitted sizes, not the raw filler, match:
//!
//! - header: the `content-type: application/json` pair (28 bytes)
//! - body: the document produced for an empty payload

use std::marker::PhantomData;

use axum::body::Body;
use axum::response::Response;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::StatusCode;
use serde::Serialize;

use super::{filler_header, to_len, RenderFailed, Responder, CHAFF_HEADER};
use crate::error::{Error, Result};
use crate::random::random_data;

/// Content type of JSON chaff.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Header bytes spent on the content type before any filler.
pub const CONTENT_TYPE_OVERHEAD: u64 = ("content-type".len() + JSON_CONTENT_TYPE.len()) as u64;

/// Responds with a caller-defined JSON document carrying the filler.
pub struct JsonResponder<F, T> {
    produce: F,
    _document: PhantomData<fn() -> T>,
}

impl<F, T> JsonResponder<F, T>
where
    F: Fn(String) -> T + Send + Sync,
    T: Serialize,
{
    /// Create a responder. `produce` receives the random payload and returns
    /// the document to serialize.
    pub fn new(produce: F) -> Self {
        Self {
            produce,
            _document: PhantomData,
        }
    }

    fn body(&self, body_size: u64) -> Result<Vec<u8>> {
        if body_size == 0 {
            return Ok(Vec::new());
        }

        let envelope = serde_json::to_vec(&(self.produce)(String::new()))?.len() as u64;
        let payload = random_data(to_len(body_size.saturating_sub(envelope)));
        Ok(serde_json::to_vec(&(self.produce)(payload))?)
    }
}

impl<F, T> Responder for JsonResponder<F, T>
where
    F: Fn(String) -> T + Send + Sync,
    T: Serialize,
{
    fn render(&self, header_size: u64, body_size: u64, _request: &Parts) -> Result<Response> {
        let body = match self.body(body_size) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("unable to marshal chaff JSON response: {}", e);
                return error_response(&e);
            }
        };

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        if let Some(value) = filler_header(header_size.saturating_sub(CONTENT_TYPE_OVERHEAD))? {
            builder = builder.header(CHAFF_HEADER, value);
        }

        Ok(builder.body(Body::from(body))?)
    }
}

/// Status 500 with a JSON error document, marked [`RenderFailed`].
fn error_response(err: &Error) -> Result<Response> {
    let body = serde_json::json!({ "error": err.to_string() }).to_string();
    Ok(Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .extension(RenderFailed)
        .body(Body::from(body))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;
    use serde::{Deserialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Example {
        field: String,
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refusing to serialize"))
        }
    }

    fn parts() -> Parts {
        Request::get("/").body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_content_type_overhead() {
        assert_eq!(CONTENT_TYPE_OVERHEAD, 28);
    }

    #[tokio::test]
    async fn test_json_shape() {
        let responder = JsonResponder::new(|field| Example { field });
        let response = responder.render(100, 250, &parts()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert!(response.extensions().get::<RenderFailed>().is_none());

        let header = response.headers().get(CHAFF_HEADER).unwrap();
        assert_eq!(header.len() as u64 + CONTENT_TYPE_OVERHEAD, 100);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!((248..=252).contains(&body.len()));

        let document: Example = serde_json::from_slice(&body).unwrap();
        assert!(!document.field.is_empty());
    }

    #[tokio::test]
    async fn test_json_empty_profile() {
        let responder = JsonResponder::new(|field| Example { field });
        let response = responder.render(0, 0, &parts()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CHAFF_HEADER).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_json_serialization_failure() {
        let responder = JsonResponder::new(|_| Unserializable);
        let response = responder.render(100, 250, &parts()).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(CHAFF_HEADER).is_none());
        assert_eq!(response.extensions().get::<RenderFailed>(), Some(&RenderFailed));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(error["error"]
            .as_str()
            .unwrap()
            .contains("refusing to serialize"));
    }
}
