//! Error types for the chaff tracker and responders.

use thiserror::Error;

/// Result type alias for chaff operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or running a tracker.
#[derive(Error, Debug)]
pub enum Error {
    /// Window capacity outside of `1..=max`
    #[error("cap must be 1 <= cap <= {max}, got: {capacity}")]
    InvalidCapacity {
        /// Requested capacity
        capacity: usize,
        /// Largest supported capacity
        max: usize,
    },

    /// No rendering strategy was supplied
    #[error("a responder is required to serve chaff")]
    NilResponder,

    /// Configuration rejected during validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No async runtime available to host the ingestion task
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The tracker was already closed
    #[error("tracker already closed")]
    AlreadyClosed,

    /// A chaff response could not be rendered
    #[error("render error: {0}")]
    Render(String),

    /// The secure random source failed
    #[error("random source failure: {0}")]
    RandomSource(String),

    /// Response construction failed
    #[error("http error: {0}")]
    Http(#[from] http::Error),

    /// Generated header value was rejected
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    /// JSON serialization failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new render error
    pub fn render(msg: impl Into<String>) -> Self {
        Error::Render(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Check if this error prevents a tracker from being built
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Error::InvalidCapacity { .. }
                | Error::NilResponder
                | Error::InvalidConfig(_)
                | Error::Runtime(_)
        )
    }
}
