//! Fixed-capacity recency buffer of samples.

use super::sample::{ProfileSnapshot, Sample};

/// Circular buffer holding the most recent `capacity` samples.
///
/// Inserts append until the buffer is full, then overwrite the slot under
/// the cursor and advance it modulo capacity.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    buffer: Vec<Sample>,
    capacity: usize,
    cursor: usize,
}

impl RollingWindow {
    /// Create an empty window. `capacity` must be at least one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// Insert a sample, evicting the oldest once full.
    pub fn push(&mut self, sample: Sample) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(sample);
            return;
        }
        self.buffer[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// Truncated arithmetic mean of every field, all-zero when empty.
    pub fn mean(&self) -> ProfileSnapshot {
        if self.buffer.is_empty() {
            return ProfileSnapshot::default();
        }

        let (mut latency, mut header, mut body) = (0u128, 0u128, 0u128);
        for sample in &self.buffer {
            latency += u128::from(sample.latency_ms);
            header += u128::from(sample.header_size);
            body += u128::from(sample.body_size);
        }

        let divisor = self.buffer.len() as u128;
        ProfileSnapshot {
            latency_ms: (latency / divisor) as u64,
            header_size: (header / divisor) as u64,
            body_size: (body / divisor) as u64,
        }
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if no sample has been recorded.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Maximum number of samples held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn expected_mean(samples: &[Sample], capacity: usize) -> Sample {
        let recent = &samples[samples.len().saturating_sub(capacity)..];
        if recent.is_empty() {
            return Sample::default();
        }
        let n = recent.len() as u64;
        Sample {
            latency_ms: recent.iter().map(|s| s.latency_ms).sum::<u64>() / n,
            header_size: recent.iter().map(|s| s.header_size).sum::<u64>() / n,
            body_size: recent.iter().map(|s| s.body_size).sum::<u64>() / n,
        }
    }

    #[test]
    fn test_empty_window() {
        let window = RollingWindow::new(10);
        assert!(window.is_empty());
        assert_eq!(window.mean(), Sample::default());
    }

    #[test]
    fn test_mean_truncates() {
        let mut window = RollingWindow::new(10);
        window.push(Sample::new(1, 2, 3));
        window.push(Sample::new(2, 3, 4));
        assert_eq!(window.mean(), Sample::new(1, 2, 3));
    }

    #[test]
    fn test_overwrites_oldest() {
        let capacity = 5;
        let mut window = RollingWindow::new(capacity);
        for i in 0..capacity as u64 {
            window.push(Sample::new(i, i, i));
        }
        let full = window.mean();
        assert_eq!(window.len(), capacity);

        window.push(Sample::new(100, 100, 100));
        assert_eq!(window.len(), capacity);
        assert_ne!(window.mean(), full);
        // 1 + 2 + 3 + 4 + 100
        assert_eq!(window.mean(), Sample::new(22, 22, 22));
    }

    #[test]
    fn test_capacity_one() {
        let mut window = RollingWindow::new(1);
        window.push(Sample::new(5, 6, 7));
        window.push(Sample::new(8, 9, 10));
        assert_eq!(window.mean(), Sample::new(8, 9, 10));
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        let mut window = RollingWindow::new(3);
        for _ in 0..3 {
            window.push(Sample::new(u64::MAX, u64::MAX, u64::MAX));
        }
        assert_eq!(window.mean(), Sample::new(u64::MAX, u64::MAX, u64::MAX));
    }

    proptest! {
        #[test]
        fn prop_mean_of_most_recent(
            capacity in 1usize..=100,
            values in prop::collection::vec((0u64..10_000, 0u64..10_000, 0u64..10_000), 0..300),
        ) {
            let samples: Vec<Sample> = values
                .into_iter()
                .map(|(l, h, b)| Sample::new(l, h, b))
                .collect();

            let mut window = RollingWindow::new(capacity);
            for sample in &samples {
                window.push(*sample);
            }

            prop_assert_eq!(window.len(), samples.len().min(capacity));
            prop_assert_eq!(window.mean(), expected_mean(&samples, capacity));
        }
    }
}
