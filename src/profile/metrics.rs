//! Tracker metrics collection.
//!
//! Counts what the tracker does with samples and chaff responses. Only
//! aggregates are kept, never request contents.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Tracker metrics collector.
pub struct TrackerMetrics {
    /// Tracker start time
    start_time: Instant,
    /// Samples accepted by the ingestion queue
    samples_enqueued: AtomicU64,
    /// Samples dropped because the queue was full
    samples_dropped: AtomicU64,
    /// Samples folded into the rolling window
    samples_ingested: AtomicU64,
    /// Chaff responses served
    chaff_served: AtomicU64,
    /// Chaff responses whose rendering failed
    render_failures: AtomicU64,
}

impl TrackerMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            samples_enqueued: AtomicU64::new(0),
            samples_dropped: AtomicU64::new(0),
            samples_ingested: AtomicU64::new(0),
            chaff_served: AtomicU64::new(0),
            render_failures: AtomicU64::new(0),
        }
    }

    pub(crate) fn increment_enqueued(&self) {
        self.samples_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_dropped(&self) {
        self.samples_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_ingested(&self) {
        self.samples_ingested.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn increment_chaff_served(&self) {
        self.chaff_served.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_render_failures(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Samples accepted by the ingestion queue.
    pub fn samples_enqueued(&self) -> u64 {
        self.samples_enqueued.load(Ordering::Relaxed)
    }

    /// Samples dropped on a full queue.
    pub fn samples_dropped(&self) -> u64 {
        self.samples_dropped.load(Ordering::Relaxed)
    }

    /// Samples folded into the window by the ingestion task.
    pub fn samples_ingested(&self) -> u64 {
        self.samples_ingested.load(Ordering::Acquire)
    }

    /// Chaff responses served.
    pub fn chaff_served(&self) -> u64 {
        self.chaff_served.load(Ordering::Relaxed)
    }

    /// Chaff renders that failed.
    pub fn render_failures(&self) -> u64 {
        self.render_failures.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            samples_enqueued: self.samples_enqueued(),
            samples_dropped: self.samples_dropped(),
            samples_ingested: self.samples_ingested(),
            chaff_served: self.chaff_served(),
            render_failures: self.render_failures(),
        }
    }

    /// Format metrics as a simple text report.
    pub fn format_report(&self) -> String {
        let snapshot = self.snapshot();

        format!(
            r#"Chaff Tracker Metrics
=====================
Uptime: {} seconds

Samples:
  Enqueued: {}
  Dropped:  {}
  Ingested: {}

Chaff:
  Served:          {}
  Render Failures: {}
"#,
            snapshot.uptime_secs,
            snapshot.samples_enqueued,
            snapshot.samples_dropped,
            snapshot.samples_ingested,
            snapshot.chaff_served,
            snapshot.render_failures,
        )
    }
}

impl Default for TrackerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of all metrics at a point in time.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub samples_enqueued: u64,
    pub samples_dropped: u64,
    pub samples_ingested: u64,
    pub chaff_served: u64,
    pub render_failures: u64,
}

impl MetricsSnapshot {
    /// Fraction of offered samples dropped on a full queue.
    pub fn drop_rate(&self) -> f64 {
        let offered = self.samples_enqueued + self.samples_dropped;
        if offered == 0 {
            0.0
        } else {
            self.samples_dropped as f64 / offered as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = TrackerMetrics::new();
        assert_eq!(metrics.samples_enqueued(), 0);
        assert_eq!(metrics.samples_ingested(), 0);
    }

    #[test]
    fn test_snapshot() {
        let metrics = TrackerMetrics::new();

        metrics.increment_enqueued();
        metrics.increment_enqueued();
        metrics.increment_ingested();
        metrics.increment_chaff_served();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.samples_enqueued, 2);
        assert_eq!(snapshot.samples_ingested, 1);
        assert_eq!(snapshot.chaff_served, 1);
        assert_eq!(snapshot.render_failures, 0);
    }

    #[test]
    fn test_drop_rate() {
        let snapshot = MetricsSnapshot {
            uptime_secs: 10,
            samples_enqueued: 75,
            samples_dropped: 25,
            samples_ingested: 75,
            chaff_served: 0,
            render_failures: 0,
        };
        assert!((snapshot.drop_rate() - 0.25).abs() < 0.01);

        let empty = TrackerMetrics::new().snapshot();
        assert_eq!(empty.drop_rate(), 0.0);
    }

    #[test]
    fn test_format_report() {
        let metrics = TrackerMetrics::new();
        metrics.increment_dropped();

        let report = metrics.format_report();
        assert!(report.contains("Chaff Tracker Metrics"));
        assert!(report.contains("Dropped:  1"));
    }
}
