// THEORY:
// `EngineConfig` is the engine's whole configuration surface. It is set once at
// construction (a few fields can be changed later through the engine) and is
// validated before anything is built, so a bad grid or budget fails fast instead
// of surfacing as a division by zero mid-tick.
//
// Defaults are the values the engine was tuned with: a 25x25 grid over a 640x480
// camera window, two tracked blobs, blobs between 4 and 80 cells, an intensity
// threshold of 15 and a 200 pixel re-association bound.

use crate::error::{Result, WatchError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rows: usize,
    pub cols: usize,
    /// Maximum number of simultaneous tracks.
    pub num_blobs: usize,
    /// Smallest blob, in cells, that is not treated as flicker.
    pub min_blob_size: usize,
    /// Largest blob, in cells, that is not treated as a global lighting change.
    pub max_blob_size: usize,
    /// Red channel delta a cell must exceed to count as changed.
    pub threshold: u8,
    /// Screen-pixel distance within which a blob continues an existing track.
    pub max_blob_distance: f64,
    pub window_width: u32,
    pub window_height: u32,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Milliseconds of ticks to skip after start-up while the camera settles.
    pub warmup_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rows: 25,
            cols: 25,
            num_blobs: 2,
            min_blob_size: 4,
            max_blob_size: 80,
            threshold: 15,
            max_blob_distance: 200.0,
            window_width: 640,
            window_height: 480,
            screen_width: 640,
            screen_height: 480,
            warmup_ms: 0.0,
        }
    }
}

impl EngineConfig {
    /// Checks every field that can be checked without building the grid.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(WatchError::InvalidGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.num_blobs == 0 {
            return Err(WatchError::InvalidBlobBudget);
        }
        if self.min_blob_size == 0 || self.min_blob_size > self.max_blob_size {
            return Err(WatchError::InvalidBlobSizeBounds {
                min: self.min_blob_size,
                max: self.max_blob_size,
            });
        }
        if !self.max_blob_distance.is_finite() || self.max_blob_distance <= 0.0 {
            return Err(WatchError::InvalidBlobDistance(self.max_blob_distance));
        }
        if !self.warmup_ms.is_finite() || self.warmup_ms < 0.0 {
            return Err(WatchError::InvalidWarmup(self.warmup_ms));
        }
        Ok(())
    }
}
