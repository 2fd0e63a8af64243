// THEORY:
// The `geometry` module holds the small value types every other layer speaks in.
// Rectangles describe where a cell lives (in the window the camera image is
// sampled from, and on the screen the result is rendered to); vectors describe
// blob centres and velocities; grid points name a cell by column and row.
//
// Rectangles follow the usual raster convention: the right and bottom edges are
// exclusive, so `Rect::new(0, 0, 10, 10)` covers pixels 0..=9 on both axes and
// neighbouring cells share an edge without overlapping.

use std::ops::{Add, Div, Mul, Sub};

/// A column/row coordinate on the cell grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPoint {
    pub col: usize,
    pub row: usize,
}

impl GridPoint {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// True when the two points differ by exactly one step horizontally or vertically.
    pub fn is_adjacent(&self, other: &GridPoint) -> bool {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row) == 1
    }
}

/// A 2D vector in screen pixels (positions) or pixels per millisecond (velocities).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: &Vec2) -> f64 {
        (*self - *other).length()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

/// An axis-aligned rectangle in integer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Half-open point test: the left/top edges are inside, the right/bottom edges are not.
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x as f64
            && point.x < self.right() as f64
            && point.y >= self.y as f64
            && point.y < self.bottom() as f64
    }

    /// True when `other` lies entirely inside this rectangle (shared edges count as inside).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// True when the two rectangles overlap with a positive area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// The smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.x as f64, self.y as f64)
    }

    pub fn mid_left(&self) -> Vec2 {
        Vec2::new(self.x as f64, self.center().y)
    }

    pub fn bottom_left(&self) -> Vec2 {
        Vec2::new(self.x as f64, self.bottom() as f64)
    }

    pub fn top_right(&self) -> Vec2 {
        Vec2::new(self.right() as f64, self.y as f64)
    }

    pub fn mid_right(&self) -> Vec2 {
        Vec2::new(self.right() as f64, self.center().y)
    }

    pub fn bottom_right(&self) -> Vec2 {
        Vec2::new(self.right() as f64, self.bottom() as f64)
    }

    pub fn mid_top(&self) -> Vec2 {
        Vec2::new(self.center().x, self.y as f64)
    }

    pub fn mid_bottom(&self) -> Vec2 {
        Vec2::new(self.center().x, self.bottom() as f64)
    }
}
