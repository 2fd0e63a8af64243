// THEORY:
// The `pipeline` module is the top-level API of the engine. `MotionEngine`
// strings the layers together and is the only thing a consuming application
// needs to hold:
//
//   frame -> GridManager::sample -> blob_detector::find_blobs -> Tracker::update
//
// It is driven once per application tick with the elapsed time supplied by the
// caller, never the wall clock, so a fixed sequence of frames and time steps
// always produces the same tracks. A tick without a frame is not an error: the
// grid is left alone and the previous tracks are returned unchanged.

use crate::config::EngineConfig;
use crate::core_modules::blob_detector::blob_detector::{self, BlobFilter};
use crate::core_modules::frame::{Frame, MaskImage};
use crate::core_modules::frame_mailbox::FrameSource;
use crate::core_modules::geometry::Rect;
use crate::core_modules::grid_manager::GridManager;
use crate::core_modules::screen_region::ScreenRegion;
use crate::error::{Result, WatchError};
use tracing::{debug, info, trace};

pub use crate::core_modules::smart_blob::Blob;
pub use crate::core_modules::tracker::TrackedBlob;
use crate::core_modules::tracker::Tracker;

/// Grid sampling, blob extraction and tracking behind one per-tick call.
pub struct MotionEngine {
    config: EngineConfig,
    grid_manager: GridManager,
    tracker: Tracker,
    warmup_remaining_ms: f64,
    ticks: u64,
}

impl MotionEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut grid_manager = GridManager::new(config.rows, config.cols)?;
        grid_manager.set_window_resolution(config.window_width, config.window_height)?;
        grid_manager.set_screen_resolution(config.screen_width, config.screen_height)?;

        info!(
            rows = config.rows,
            cols = config.cols,
            num_blobs = config.num_blobs,
            threshold = config.threshold,
            window = ?(config.window_width, config.window_height),
            screen = ?(config.screen_width, config.screen_height),
            "motion engine configured"
        );

        Ok(Self {
            tracker: Tracker::new(config.num_blobs, config.max_blob_distance),
            warmup_remaining_ms: config.warmup_ms,
            grid_manager,
            config,
            ticks: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridManager {
        &self.grid_manager
    }

    pub fn screen_regions(&self) -> &[ScreenRegion] {
        self.grid_manager.screen_regions()
    }

    /// Number of ticks processed, including skipped ones.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_warming_up(&self) -> bool {
        self.warmup_remaining_ms > 0.0
    }

    pub fn set_window_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        self.grid_manager.set_window_resolution(width, height)?;
        self.config.window_width = width;
        self.config.window_height = height;
        Ok(())
    }

    pub fn set_screen_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        self.grid_manager.set_screen_resolution(width, height)?;
        self.config.screen_width = width;
        self.config.screen_height = height;
        Ok(())
    }

    /// Restricts detection to cells inside `view_rect` that the mask, if any, leaves visible.
    pub fn set_mask(&mut self, view_rect: Rect, mask: Option<&MaskImage>) -> Result<()> {
        self.grid_manager.set_mask(view_rect, mask)?;
        debug!(
            active = self.grid_manager.active_cell_count(),
            total = self.grid_manager.cells().len(),
            "mask applied"
        );
        Ok(())
    }

    /// Changes the track budget. Live tracks beyond the new budget are dropped.
    pub fn set_num_blobs(&mut self, num_blobs: usize) -> Result<()> {
        if num_blobs == 0 {
            return Err(WatchError::InvalidBlobBudget);
        }
        self.config.num_blobs = num_blobs;
        self.tracker.set_max_tracks(num_blobs);
        debug!(num_blobs, "blob budget changed");
        Ok(())
    }

    /// The tracks produced by the most recent tick.
    pub fn tracked_blobs(&self) -> &[TrackedBlob] {
        self.tracker.tracked_blobs()
    }

    /// Tracks whose cells overlap `rect`, e.g. an on-screen button.
    pub fn colliding_tracks<'a>(&'a self, rect: &'a Rect) -> impl Iterator<Item = &'a TrackedBlob> + 'a {
        self.tracked_blobs().iter().filter(move |track| track.collides_with(rect))
    }

    fn blob_filter(&self) -> BlobFilter {
        BlobFilter {
            min_size: self.config.min_blob_size,
            max_size: self.config.max_blob_size,
            max_blobs: self.config.num_blobs,
        }
    }

    /// Runs one tick. `frame` is `None` when no new frame arrived since the last tick.
    pub fn update<F: Frame + ?Sized>(&mut self, frame: Option<&F>, elapsed_ms: f64) -> Result<&[TrackedBlob]> {
        if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
            return Err(WatchError::InvalidElapsedTime(elapsed_ms));
        }
        self.ticks += 1;

        if self.warmup_remaining_ms > 0.0 {
            self.warmup_remaining_ms -= elapsed_ms;
            trace!(remaining_ms = self.warmup_remaining_ms.max(0.0), "warming up");
            return Ok(self.tracker.tracked_blobs());
        }

        let Some(frame) = frame else {
            trace!(tick = self.ticks, "no frame available");
            return Ok(self.tracker.tracked_blobs());
        };

        let filter = self.blob_filter();
        let blobs = blob_detector::extract(&mut self.grid_manager, frame, self.config.threshold, &filter)?;
        let regions = self.grid_manager.screen_regions();
        Ok(self.tracker.update(blobs, regions, elapsed_ms))
    }

    /// Pulls the newest frame from `source`, if any, and runs one tick with it.
    pub fn tick<S>(&mut self, source: &S, elapsed_ms: f64) -> Result<&[TrackedBlob]>
    where
        S: FrameSource + ?Sized,
        S::Frame: Frame,
    {
        let frame = source.try_get_frame();
        self.update(frame.as_ref(), elapsed_ms)
    }
}
