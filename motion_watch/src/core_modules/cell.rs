// THEORY:
// A `Cell` is one sampling point of the watch grid. Rather than averaging a
// whole block of pixels, a cell reads a single pixel (the top-left corner of
// its window rectangle) every tick and remembers the value it read on the
// previous tick. A cell is "changed" when the two readings differ by more than
// the configured threshold.
//
// Cells carry two rectangles: the window rectangle, in the coordinate space of
// the sampled camera image, and the screen rectangle, in the coordinate space the
// consumer renders into. Blobs are assembled from screen rectangles.
//
// The `label` is scratch state owned by the blob detector. It is reset on every
// sampling pass and only written during that same pass.

use crate::core_modules::geometry::{GridPoint, Rect};

/// Transient blob membership for a single detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellLabel {
    /// Unchanged this tick, or masked out.
    #[default]
    Unassigned,
    /// Changed this tick, not yet claimed by a blob.
    Candidate,
    /// Claimed by the blob with this (1-based, discovery order) label.
    Assigned(u32),
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub position: GridPoint,
    /// Where the cell samples from, in window coordinates.
    pub window_rect: Rect,
    /// Where the cell is drawn, in screen coordinates.
    pub screen_rect: Rect,
    /// Whether the cell participates in detection (inside the view and not masked out).
    pub active: bool,
    prev_intensity: u8,
    /// `None` until the cell has been sampled once.
    now_intensity: Option<u8>,
    pub label: CellLabel,
}

impl Cell {
    pub fn new(col: usize, row: usize) -> Self {
        Self {
            position: GridPoint::new(col, row),
            window_rect: Rect::default(),
            screen_rect: Rect::default(),
            active: true,
            prev_intensity: 0,
            now_intensity: None,
            label: CellLabel::Unassigned,
        }
    }

    /// Sample point in window coordinates.
    pub fn sample_point(&self) -> (u32, u32) {
        (self.window_rect.x.max(0) as u32, self.window_rect.y.max(0) as u32)
    }

    pub fn prev_intensity(&self) -> u8 {
        self.prev_intensity
    }

    pub fn now_intensity(&self) -> Option<u8> {
        self.now_intensity
    }

    pub fn is_candidate(&self) -> bool {
        self.label == CellLabel::Candidate
    }

    /// Feeds a new reading into the cell and marks it as a candidate if it changed.
    ///
    /// The first reading only seeds the history. Inactive cells keep their history
    /// frozen and never become candidates. Returns whether the cell is a candidate.
    pub fn observe(&mut self, intensity: u8, threshold: u8) -> bool {
        let last = *self.now_intensity.get_or_insert(intensity);
        self.label = CellLabel::Unassigned;

        if !self.active {
            return false;
        }

        self.prev_intensity = last;
        self.now_intensity = Some(intensity);
        if intensity.abs_diff(self.prev_intensity) > threshold {
            self.label = CellLabel::Candidate;
        }
        self.is_candidate()
    }
}
