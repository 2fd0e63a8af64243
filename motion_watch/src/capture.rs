// THEORY:
// The `capture` module runs the frame producer on its own schedule, apart from
// the engine's tick. A tokio task wakes at the capture rate, asks a
// `FrameGrabber` for the next frame on the blocking pool (camera reads block),
// and publishes it to a shared `FrameMailbox`. The engine pulls from the same
// mailbox whenever it ticks.
//
// The two sides never wait for each other. If the engine is slower than the
// camera, the mailbox overwrites and the engine always sees the freshest frame.
// If the camera is slower, the engine's tick simply finds the mailbox empty.
//
// Stopping is cooperative: `CaptureHandle::stop` flips a watch channel, the task
// notices at its next wake-up, and the handle joins it.

use crate::core_modules::frame_mailbox::FrameMailbox;
use crate::error::{Result, WatchError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Capture rate used when nothing else is configured.
pub const DEFAULT_CAPTURE_FPS: u32 = 40;

/// Highest accepted rate; anything faster would need a sub-microsecond period.
pub const MAX_CAPTURE_FPS: u32 = 1_000_000;

/// A blocking source of frames, such as a camera or a directory of images.
pub trait FrameGrabber: Send + 'static {
    type Frame: Send + 'static;

    /// Reads the next frame. `Ok(None)` means the source is exhausted.
    fn grab(&mut self) -> Result<Option<Self::Frame>>;
}

/// Totals reported when a capture task finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureStats {
    pub frames_captured: u64,
    pub frames_dropped: u64,
}

pub struct CaptureHandle<F> {
    mailbox: Arc<FrameMailbox<F>>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Result<u64>>,
}

impl<F> CaptureHandle<F> {
    /// The mailbox the task publishes into; hand it to `MotionEngine::tick`.
    pub fn mailbox(&self) -> Arc<FrameMailbox<F>> {
        Arc::clone(&self.mailbox)
    }

    /// True once the task has ended, whether stopped, exhausted or failed.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the task to stop and waits for it to finish.
    pub async fn stop(self) -> Result<CaptureStats> {
        // The task may already be gone; that is fine.
        let _ = self.stop_tx.send(true);
        let frames_captured = self
            .task
            .await
            .map_err(|e| WatchError::Capture(format!("capture task panicked or was cancelled: {e}")))??;
        let stats = CaptureStats {
            frames_captured,
            frames_dropped: self.mailbox.dropped_frames(),
        };
        info!(captured = stats.frames_captured, dropped = stats.frames_dropped, "capture stopped");
        Ok(stats)
    }
}

/// Starts capturing from `grabber` at `fps` frames per second, `1..=MAX_CAPTURE_FPS`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_capture<G: FrameGrabber>(grabber: G, fps: u32) -> Result<CaptureHandle<G::Frame>> {
    if fps == 0 || fps > MAX_CAPTURE_FPS {
        return Err(WatchError::InvalidCaptureRate);
    }

    let mailbox = Arc::new(FrameMailbox::new());
    let (stop_tx, stop_rx) = watch::channel(false);
    let period = Duration::from_micros(1_000_000 / fps as u64);

    info!(fps, "capture starting");
    let task = tokio::spawn(run_capture(grabber, Arc::clone(&mailbox), period, stop_rx));

    Ok(CaptureHandle {
        mailbox,
        stop_tx,
        task,
    })
}

async fn run_capture<G: FrameGrabber>(
    mut grabber: G,
    mailbox: Arc<FrameMailbox<G::Frame>>,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) -> Result<u64> {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut captured = 0u64;

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                // A closed channel means the handle was dropped; stop either way.
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let (returned, grabbed) = tokio::task::spawn_blocking(move || {
                    let grabbed = grabber.grab();
                    (grabber, grabbed)
                })
                .await
                .map_err(|e| WatchError::Capture(format!("frame grabber panicked: {e}")))?;
                grabber = returned;

                match grabbed {
                    Ok(Some(frame)) => {
                        if mailbox.publish(frame) {
                            debug!(frame = captured, "unread frame overwritten");
                        }
                        captured += 1;
                    }
                    Ok(None) => {
                        info!(captured, "frame source exhausted");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "frame grabber failed");
                        return Err(e);
                    }
                }
            }
        }
    }

    Ok(captured)
}
