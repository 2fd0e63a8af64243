//! Error types for motion_watch.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("grid must have at least one row and one column, got {rows}x{cols}")]
    InvalidGrid { rows: usize, cols: usize },

    #[error("resolution {width}x{height} cannot be partitioned into a {cols}x{rows} grid")]
    InvalidResolution {
        width: u32,
        height: u32,
        cols: usize,
        rows: usize,
    },

    #[error("blob budget must be at least 1")]
    InvalidBlobBudget,

    #[error("blob size bounds are invalid: min {min}, max {max}")]
    InvalidBlobSizeBounds { min: usize, max: usize },

    #[error("maximum blob distance must be a positive, finite number, got {0}")]
    InvalidBlobDistance(f64),

    #[error("warm-up time must be a non-negative, finite number of milliseconds, got {0}")]
    InvalidWarmup(f64),

    #[error("capture rate must be between 1 and 1000000 frames per second")]
    InvalidCaptureRate,

    #[error("elapsed time must be a positive, finite number of milliseconds, got {0}")]
    InvalidElapsedTime(f64),

    #[error("frame buffer of {width}x{height} RGBA needs {expected} bytes, got {actual}")]
    InvalidFrameBuffer {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("sample point ({x}, {y}) is outside the {width}x{height} frame")]
    SampleOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("capture failed: {0}")]
    Capture(String),
}

impl WatchError {
    /// True for errors raised while validating configuration, as opposed to
    /// errors surfaced during a tick.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            WatchError::InvalidGrid { .. }
                | WatchError::InvalidResolution { .. }
                | WatchError::InvalidBlobBudget
                | WatchError::InvalidBlobSizeBounds { .. }
                | WatchError::InvalidBlobDistance(_)
                | WatchError::InvalidWarmup(_)
                | WatchError::InvalidCaptureRate
        )
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
