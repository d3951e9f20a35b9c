//! Observations of completed real requests.

use std::time::Duration;

/// Latency and size of one completed real request.
///
/// The mean over a window of samples is itself a `Sample`, see
/// [`ProfileSnapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Sample {
    /// Time spent in the wrapped handler, in milliseconds
    pub latency_ms: u64,
    /// Sum of header name and value lengths, in bytes
    pub header_size: u64,
    /// Response body length, in bytes
    pub body_size: u64,
}

/// Rolling mean of recent samples.
pub type ProfileSnapshot = Sample;

impl Sample {
    /// Create a sample from raw measurements.
    pub fn new(latency_ms: u64, header_size: u64, body_size: u64) -> Self {
        Self {
            latency_ms,
            header_size,
            body_size,
        }
    }

    /// Create a sample from a measured elapsed time.
    pub fn from_elapsed(elapsed: Duration, header_size: u64, body_size: u64) -> Self {
        Self::new(elapsed.as_millis() as u64, header_size, body_size)
    }

    /// Latency as a duration.
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// True if every field is zero.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
