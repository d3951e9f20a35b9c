//! Request profile tracking.
//!
//! Keeps a rolling history of real requests so that chaff responses can
//! mimic them:
//!
//! 1. **Sample**: latency, header size and body size of one real request
//! 2. **RollingWindow**: the most recent samples, averaged on demand
//! 3. **Tracker**: shared window fed by a background ingestion task
//!
//! ## Data Flow
//!
//! ```text
//! real request ──► Sample ──► enqueue (drop if full) ──► ingestion task
//!                                                             │
//!                                                             ▼
//! chaff request ◄── Responder ◄── snapshot (mean) ◄── RollingWindow
//! ```

mod metrics;
mod sample;
mod tracker;
mod window;

pub use metrics::{MetricsSnapshot, TrackerMetrics};
pub use sample::{ProfileSnapshot, Sample};
pub use tracker::Tracker;
pub use window::RollingWindow;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest supported window capacity.
pub const MAX_CAPACITY: usize = 100;

/// Window capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = MAX_CAPACITY;

/// Configuration for a [`Tracker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Number of recent samples averaged, `1..=MAX_CAPACITY`
    pub capacity: usize,
    /// Bound of the ingestion queue
    pub queue_capacity: usize,
}

impl TrackerConfig {
    /// Configuration with the given window capacity and a queue of the same
    /// size.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            queue_capacity: capacity.max(1),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.capacity < 1 || self.capacity > MAX_CAPACITY {
            return Err(Error::InvalidCapacity {
                capacity: self.capacity,
                max: MAX_CAPACITY,
            });
        }
        if self.queue_capacity == 0 {
            return Err(Error::config("queue_capacity must be at least 1"));
        }
        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
