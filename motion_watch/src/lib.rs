// THEORY:
// This file is the entry point for the `motion_watch` library crate. The engine
// turns a live camera image into a handful of persistent, velocity-bearing
// "tracked blobs" that an interactive application can treat as objects, for
// example to press on-screen buttons by waving at them.
//
// Layers, leaves first:
// - `core_modules::grid_manager` samples one pixel per grid cell and flags the
//   cells that changed since the previous tick.
// - `core_modules::blob_detector` joins adjacent changed cells into blobs,
//   filters them by size and keeps the largest few.
// - `core_modules::tracker` matches blobs to the tracks from the previous tick.
// - `pipeline::MotionEngine` drives the three once per tick.
// - `capture` runs a frame producer on its own schedule and hands frames over
//   through a single-slot `FrameMailbox`.

pub mod capture;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use capture::{spawn_capture, CaptureHandle, CaptureStats, FrameGrabber, DEFAULT_CAPTURE_FPS, MAX_CAPTURE_FPS};
pub use config::EngineConfig;
pub use core_modules::frame::{Frame, MaskImage, RawFrame};
pub use core_modules::frame_mailbox::{FrameMailbox, FrameSource};
pub use core_modules::geometry::{GridPoint, Rect, Vec2};
pub use core_modules::screen_region::{RegionKind, ScreenRegion};
pub use error::{Result, WatchError};
pub use pipeline::{Blob, MotionEngine, TrackedBlob};
