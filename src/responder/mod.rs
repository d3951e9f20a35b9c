//! Chaff response rendering.
//!
//! A [`Responder`] turns a target header size and body size into a response
//! of roughly that shape, filled with random data:
//!
//! 1. **Plain**: base64 filler in the `X-Chaff` header and the body
//! 2. **Json**: base64 filler wrapped in a caller-defined JSON document
//!
//! Custom formats plug in by implementing the trait.

mod json;
mod plain;

pub use json::{JsonResponder, CONTENT_TYPE_OVERHEAD, JSON_CONTENT_TYPE};
pub use plain::PlainResponder;

use axum::response::Response;
use http::header::{HeaderName, HeaderValue};
use http::request::Parts;

use crate::error::Result;
use crate::random::random_data;

/// Header carrying random filler on chaff responses.
pub const CHAFF_HEADER: HeaderName = HeaderName::from_static("x-chaff");

/// Response extension marking a render failure the responder already turned
/// into a response of its own, such as the JSON 500 error document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderFailed;

/// Renders chaff responses of a requested shape.
pub trait Responder: Send + Sync {
    /// Build a status 200 response whose headers and body approximate the
    /// given sizes in bytes.
    ///
    /// A failure answered with a response instead of an `Err` must carry the
    /// [`RenderFailed`] extension so it is still counted.
    fn render(&self, header_size: u64, body_size: u64, request: &Parts) -> Result<Response>;
}

/// Random filler for the chaff header, `None` when nothing would be sent.
pub(crate) fn filler_header(size: u64) -> Result<Option<HeaderValue>> {
    let filler = random_data(to_len(size));
    if filler.is_empty() {
        return Ok(None);
    }
    Ok(Some(HeaderValue::try_from(filler)?))
}

/// Clamp a byte count to `usize`.
pub(crate) fn to_len(size: u64) -> usize {
    usize::try_from(size).unwrap_or(usize::MAX)
}
