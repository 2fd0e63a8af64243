// THEORY:
// The `FrameMailbox` is the handoff between an independently scheduled frame
// producer (a capture task) and the engine's tick. It holds at most one frame.
// Publishing overwrites whatever is there, so an engine that falls behind sees
// the newest frame and the stale ones are simply dropped; the producer never
// waits on the consumer. Taking empties the slot, so the engine never processes
// the same frame twice and never blocks when nothing new has arrived.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Anything the engine can pull a frame from without blocking.
pub trait FrameSource {
    type Frame;

    /// The newest unread frame, if any. Consumes it.
    fn try_get_frame(&self) -> Option<Self::Frame>;
}

/// A single-slot, overwrite-on-write frame buffer.
#[derive(Debug)]
pub struct FrameMailbox<F> {
    slot: Mutex<Option<F>>,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl<F> Default for FrameMailbox<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> FrameMailbox<F> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Stores `frame`, replacing any unread one. Returns true if a frame was dropped.
    pub fn publish(&self, frame: F) -> bool {
        let replaced = self.slot.lock().replace(frame).is_some();
        self.published.fetch_add(1, Ordering::Relaxed);
        if replaced {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        replaced
    }

    pub fn take(&self) -> Option<F> {
        self.slot.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }

    /// Frames published since creation.
    pub fn published_frames(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Frames overwritten before anyone took them.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<F> FrameSource for FrameMailbox<F> {
    type Frame = F;

    fn try_get_frame(&self) -> Option<F> {
        self.take()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Arc<S> {
    type Frame = S::Frame;

    fn try_get_frame(&self) -> Option<S::Frame> {
        (**self).try_get_frame()
    }
}
