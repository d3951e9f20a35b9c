//! Pass-through response body that counts bytes.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use bytes::Buf;
use http_body::{Body, Frame, SizeHint};

/// Byte count shared between a [`CountingBody`] and its observers.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter(Arc<AtomicU64>);

impl ByteCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `bytes` to the count.
    pub fn add(&self, bytes: u64) {
        self.0.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Current count.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

type Completion = Box<dyn FnOnce(u64) + Send>;

/// Forwards every frame of the wrapped body unchanged while counting data
/// bytes.
///
/// The completion callback runs exactly once with the final count, when the
/// body reaches its end, fails, or is dropped early.
pub struct CountingBody<B> {
    inner: B,
    counter: ByteCounter,
    on_complete: Option<Completion>,
}

impl<B> CountingBody<B> {
    /// Wrap a body.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            counter: ByteCounter::new(),
            on_complete: None,
        }
    }

    /// Run `f` with the byte count once the body is finished.
    pub fn on_complete(mut self, f: impl FnOnce(u64) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Handle to the byte count.
    pub fn counter(&self) -> ByteCounter {
        self.counter.clone()
    }

    fn finish(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(self.counter.get());
        }
    }
}

impl<B> Body for CountingBody<B>
where
    B: Body + Unpin,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let frame = ready!(Pin::new(&mut this.inner).poll_frame(cx));

        match &frame {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    this.counter.add(data.remaining() as u64);
                }
                if this.inner.is_end_stream() {
                    this.finish();
                }
            }
            Some(Err(_)) | None => this.finish(),
        }

        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> Drop for CountingBody<B> {
    fn drop(&mut self) {
        self.finish();
    }
}
