//! Rolling request profile shared between request handlers.
//!
//! Real requests hand their samples to a bounded queue; a single background
//! task drains it into the rolling window. Chaff responses read the window
//! through [`Tracker::snapshot`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::metrics::TrackerMetrics;
use super::sample::{ProfileSnapshot, Sample};
use super::window::RollingWindow;
use super::TrackerConfig;
use crate::error::{Error, Result};
use crate::responder::{PlainResponder, Responder};

/// Latency and size tracker for real traffic.
///
/// Must be created inside a tokio runtime, which hosts the ingestion task.
pub struct Tracker {
    window: Arc<RwLock<RollingWindow>>,
    /// Producer half of the ingestion queue, `None` once closed
    queue: RwLock<Option<mpsc::Sender<Sample>>>,
    stop: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    responder: Arc<dyn Responder>,
    metrics: Arc<TrackerMetrics>,
    closed: AtomicBool,
}

impl Tracker {
    /// Create a tracker with the default capacity and a plain responder.
    pub fn new() -> Result<Self> {
        Self::from_config(&TrackerConfig::default(), Some(Arc::new(PlainResponder)))
    }

    /// Create a tracker with a custom capacity and a plain responder.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_responder(capacity, Some(Arc::new(PlainResponder)))
    }

    /// Create a tracker with a custom capacity and responder.
    pub fn with_responder(
        capacity: usize,
        responder: Option<Arc<dyn Responder>>,
    ) -> Result<Self> {
        Self::from_config(&TrackerConfig::with_capacity(capacity), responder)
    }

    /// Create a tracker from configuration.
    ///
    /// Spawns the ingestion task on the current tokio runtime. Stop it with
    /// [`Tracker::close`] or [`Tracker::shutdown`].
    pub fn from_config(
        config: &TrackerConfig,
        responder: Option<Arc<dyn Responder>>,
    ) -> Result<Self> {
        config.validate()?;
        let responder = responder.ok_or(Error::NilResponder)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Runtime(e.to_string()))?;

        let window = Arc::new(RwLock::new(RollingWindow::new(config.capacity)));
        let metrics = Arc::new(TrackerMetrics::new());
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity);
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = runtime.spawn(ingest(
            Arc::clone(&window),
            Arc::clone(&metrics),
            queue_rx,
            stop_rx,
        ));

        tracing::debug!(
            "tracker started, capacity {} queue {}",
            config.capacity,
            config.queue_capacity
        );

        Ok(Self {
            window,
            queue: RwLock::new(Some(queue_tx)),
            stop: Mutex::new(Some(stop_tx)),
            task: Mutex::new(Some(task)),
            responder,
            metrics,
            closed: AtomicBool::new(false),
        })
    }

    /// Insert a sample directly into the window.
    pub fn record(&self, sample: Sample) {
        self.window.write().push(sample);
    }

    /// Offer a sample to the ingestion task without waiting.
    ///
    /// Returns false if the sample was dropped: the queue was full or the
    /// tracker is closed.
    pub fn enqueue(&self, sample: Sample) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }

        let queue = self.queue.read();
        let Some(tx) = queue.as_ref() else {
            return false;
        };

        match tx.try_send(sample) {
            Ok(()) => {
                self.metrics.increment_enqueued();
                true
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.increment_dropped();
                tracing::trace!("ingestion queue full, dropping sample");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Mean latency and sizes over the current window.
    pub fn snapshot(&self) -> ProfileSnapshot {
        self.window.read().mean()
    }

    /// Stop the ingestion task and release the queue.
    ///
    /// Samples still queued are discarded. A second call returns
    /// [`Error::AlreadyClosed`].
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyClosed);
        }

        if let Some(stop) = self.stop.lock().take() {
            // The task may already be gone if the runtime shut down.
            let _ = stop.send(());
        }
        self.queue.write().take();

        tracing::debug!("tracker closed");
        Ok(())
    }

    /// Close the tracker and wait for the ingestion task to exit.
    pub async fn shutdown(&self) -> Result<()> {
        self.close()?;

        let task = self.task.lock().take();
        if let Some(task) = task {
            task.await.map_err(|e| Error::Runtime(e.to_string()))?;
        }
        Ok(())
    }

    /// True once [`Tracker::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of samples currently in the window.
    pub fn len(&self) -> usize {
        self.window.read().len()
    }

    /// True if the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.window.read().is_empty()
    }

    /// Window capacity.
    pub fn capacity(&self) -> usize {
        self.window.read().capacity()
    }

    /// Strategy used to render chaff responses.
    pub fn responder(&self) -> &Arc<dyn Responder> {
        &self.responder
    }

    /// Tracker metrics.
    pub fn metrics(&self) -> &TrackerMetrics {
        &self.metrics
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if !self.is_closed() {
            let _ = self.close();
        }
    }
}

/// Ingestion loop: the only consumer of the sample queue.
async fn ingest(
    window: Arc<RwLock<RollingWindow>>,
    metrics: Arc<TrackerMetrics>,
    mut queue: mpsc::Receiver<Sample>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;

            _ = &mut stop => break,
            sample = queue.recv() => match sample {
                Some(sample) => {
                    window.write().push(sample);
                    metrics.increment_ingested();
                }
                None => break,
            },
        }
    }

    tracing::debug!("ingestion task stopped");
}
