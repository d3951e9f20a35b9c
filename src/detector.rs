//! Chaff request detection.
//!
//! A [`Detector`] decides whether an incoming request is chaff. It runs on
//! every request, so implementations must be cheap and free of side effects.

use http::header::HeaderName;
use http::request::Parts;

use crate::error::{Error, Result};

/// Classifies requests as chaff or real.
pub trait Detector: Send + Sync {
    /// True if the request should be answered with chaff.
    fn is_chaff(&self, request: &Parts) -> bool;
}

impl<F> Detector for F
where
    F: Fn(&Parts) -> bool + Send + Sync,
{
    fn is_chaff(&self, request: &Parts) -> bool {
        self(request)
    }
}

/// Marks a request as chaff when a header is present and non-empty.
#[derive(Debug, Clone)]
pub struct HeaderDetector {
    header: HeaderName,
}

impl HeaderDetector {
    /// Create a detector for the named header.
    pub fn new(header: &str) -> Result<Self> {
        let header = HeaderName::try_from(header)
            .map_err(|e| Error::config(format!("invalid detector header {:?}: {}", header, e)))?;
        Ok(Self { header })
    }

    /// Header inspected by this detector.
    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

impl Detector for HeaderDetector {
    fn is_chaff(&self, request: &Parts) -> bool {
        request
            .headers
            .get(&self.header)
            .is_some_and(|value| !value.is_empty())
    }
}
