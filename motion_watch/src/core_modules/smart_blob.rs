// THEORY:
// A `Blob` is a single, 4-connected cluster of changed cells found in one tick.
// It is a plain data container: the blob detector fills in its cells and screen
// rectangles, resolves its geometry once, and hands it on. It has no memory of
// earlier frames; persistence across frames is the tracker's job.

use crate::core_modules::geometry::{GridPoint, Rect, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Rank within the tick that produced it (0 = largest). Not persistent.
    pub id: usize,
    /// Grid coordinates of every member cell, in fill order.
    pub cells: Vec<GridPoint>,
    /// Screen rectangles of every member cell, parallel to `cells`.
    pub rects: Vec<Rect>,
    /// Union of `rects`.
    pub bounding_rect: Rect,
    /// Centroid of `bounding_rect`.
    pub center: Vec2,
}

impl Blob {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            cells: Vec::new(),
            rects: Vec::new(),
            bounding_rect: Rect::default(),
            center: Vec2::ZERO,
        }
    }

    pub(crate) fn push(&mut self, cell: GridPoint, rect: Rect) {
        self.cells.push(cell);
        self.rects.push(rect);
    }

    /// Number of member cells.
    pub fn size(&self) -> usize {
        self.rects.len()
    }

    pub(crate) fn calc_geometry(&mut self) {
        let mut rects = self.rects.iter();
        if let Some(first) = rects.next() {
            self.bounding_rect = rects.fold(*first, |acc, rect| acc.union(rect));
        }
        self.center = self.bounding_rect.center();
    }
}
