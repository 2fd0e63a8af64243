// THEORY:
// The `GridManager` owns the entire R x C array of `Cell`s and everything that
// decides where they sample from. It is the temporal layer of the engine: each
// tick it reads one pixel per cell from the incoming frame and leaves behind a
// map of which cells changed since the previous tick.
//
// Key architectural principles:
// 1.  **Arena, not pointers**: cells live in one flat `Vec`, row-major. A cell's
//     up/down/left/right neighbours are computed from its index, so adjacency is
//     fixed at construction, symmetric by definition, and free of aliasing.
// 2.  **Two coordinate spaces**: the window resolution decides where each cell
//     samples the camera image; the screen resolution decides where its blob
//     rectangles land. Either can change at runtime; the topology never does.
// 3.  **Masking**: a cell takes part in detection only when its window rectangle
//     lies inside the view rectangle and, if a mask image is supplied, the mask
//     is non-zero (red channel) at the cell's sample point.

use crate::core_modules::cell::Cell;
use crate::core_modules::frame::{Frame, MaskImage};
use crate::core_modules::geometry::{GridPoint, Rect};
use crate::core_modules::screen_region::{build_screen_regions, ScreenRegion};
use crate::error::{Result, WatchError};

/// One of the four grid directions. There are no diagonal neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Manages the cell grid and the resolution/mask configuration it samples with.
pub struct GridManager {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    window_rect: Rect,
    screen_rect: Rect,
    screen_regions: Vec<ScreenRegion>,
}

impl GridManager {
    /// Builds a `rows x cols` grid. Every cell starts active with a zero-sized rect
    /// until a window and screen resolution are set.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(WatchError::InvalidGrid { rows, cols });
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Cell::new(col, row));
            }
        }

        Ok(Self {
            rows,
            cols,
            cells,
            window_rect: Rect::default(),
            screen_rect: Rect::default(),
            screen_regions: Vec::new(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn window_rect(&self) -> Rect {
        self.window_rect
    }

    pub fn screen_rect(&self) -> Rect {
        self.screen_rect
    }

    pub fn screen_regions(&self) -> &[ScreenRegion] {
        &self.screen_regions
    }

    pub fn index_of(&self, point: GridPoint) -> Option<usize> {
        if point.col < self.cols && point.row < self.rows {
            Some(point.row * self.cols + point.col)
        } else {
            None
        }
    }

    pub fn cell(&self, point: GridPoint) -> Option<&Cell> {
        self.index_of(point).map(|index| &self.cells[index])
    }

    /// Index of the neighbour of `index` in `direction`, or `None` on the grid edge.
    pub fn neighbor(&self, index: usize, direction: Direction) -> Option<usize> {
        let row = index / self.cols;
        let col = index % self.cols;
        match direction {
            Direction::Up if row > 0 => Some(index - self.cols),
            Direction::Down if row + 1 < self.rows => Some(index + self.cols),
            Direction::Left if col > 0 => Some(index - 1),
            Direction::Right if col + 1 < self.cols => Some(index + 1),
            _ => None,
        }
    }

    /// Partitions the sampled image into cells and recomputes every sample point.
    pub fn set_window_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        let (hgap, vgap) = self.cell_size(width, height)?;
        self.window_rect = Rect::new(0, 0, width as i32, height as i32);
        let cols = self.cols;
        for (index, cell) in self.cells.iter_mut().enumerate() {
            let (row, col) = (index / cols, index % cols);
            cell.window_rect = Rect::new(col as i32 * hgap, row as i32 * vgap, hgap, vgap);
        }
        Ok(())
    }

    /// Partitions the screen into cells and rebuilds the screen regions.
    pub fn set_screen_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        let (hgap, vgap) = self.cell_size(width, height)?;
        self.screen_rect = Rect::new(0, 0, width as i32, height as i32);
        let cols = self.cols;
        for (index, cell) in self.cells.iter_mut().enumerate() {
            let (row, col) = (index / cols, index % cols);
            cell.screen_rect = Rect::new(col as i32 * hgap, row as i32 * vgap, hgap, vgap);
        }
        self.screen_regions = build_screen_regions(width as i32, height as i32);
        Ok(())
    }

    fn cell_size(&self, width: u32, height: u32) -> Result<(i32, i32)> {
        let too_small = (width as usize) < self.cols || (height as usize) < self.rows;
        if width == 0 || height == 0 || too_small || width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(WatchError::InvalidResolution {
                width,
                height,
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok((
            (width as usize / self.cols) as i32,
            (height as usize / self.rows) as i32,
        ))
    }

    /// Recomputes which cells take part in detection.
    ///
    /// A cell is active when its window rect lies within `view_rect` and the mask,
    /// if any, has a non-zero red channel at the cell's sample point.
    pub fn set_mask(&mut self, view_rect: Rect, mask: Option<&MaskImage>) -> Result<()> {
        for cell in self.cells.iter_mut() {
            let inside = view_rect.contains_rect(&cell.window_rect);
            cell.active = match mask {
                Some(mask) => {
                    let (x, y) = cell.sample_point();
                    inside && mask.is_visible(x, y)?
                }
                None => inside,
            };
        }
        Ok(())
    }

    pub fn active_cell_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.active).count()
    }

    /// Samples every cell from `frame` and flags the active cells that changed by
    /// more than `threshold`. Returns the number of candidate cells.
    pub fn sample<F: Frame + ?Sized>(&mut self, frame: &F, threshold: u8) -> Result<usize> {
        // Read every cell before touching any history, so a bad frame leaves the grid as it was.
        let intensities = self
            .cells
            .iter()
            .map(|cell| {
                let (x, y) = cell.sample_point();
                frame.sample(x, y)
            })
            .collect::<Result<Vec<u8>>>()?;

        let mut candidates = 0;
        for (cell, intensity) in self.cells.iter_mut().zip(intensities) {
            if cell.observe(intensity, threshold) {
                candidates += 1;
            }
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::cell::CellLabel;
    use image::{Rgba, RgbaImage};

    fn grid(rows: usize, cols: usize, size: u32) -> GridManager {
        let mut grid = GridManager::new(rows, cols).unwrap();
        grid.set_window_resolution(size, size).unwrap();
        grid.set_screen_resolution(size, size).unwrap();
        grid
    }

    #[test]
    fn rejects_empty_grid() {
        assert!(matches!(
            GridManager::new(0, 5),
            Err(WatchError::InvalidGrid { rows: 0, cols: 5 })
        ));
    }

    #[test]
    fn rejects_zero_resolution() {
        let mut grid = GridManager::new(4, 4).unwrap();
        assert!(grid.set_window_resolution(0, 100).is_err());
        assert!(grid.set_screen_resolution(100, 0).is_err());
        assert!(grid.set_window_resolution(3, 100).is_err());
        assert!(grid.set_window_resolution(4, 4).is_ok());
    }

    #[test]
    fn neighbours_are_symmetric_and_stop_at_edges() {
        let grid = GridManager::new(3, 4).unwrap();
        for index in 0..grid.cells().len() {
            for (dir, back) in [
                (Direction::Up, Direction::Down),
                (Direction::Down, Direction::Up),
                (Direction::Left, Direction::Right),
                (Direction::Right, Direction::Left),
            ] {
                if let Some(other) = grid.neighbor(index, dir) {
                    assert_eq!(grid.neighbor(other, back), Some(index));
                }
            }
        }
        assert_eq!(grid.neighbor(0, Direction::Up), None);
        assert_eq!(grid.neighbor(0, Direction::Left), None);
        assert_eq!(grid.neighbor(3, Direction::Right), None);
        assert_eq!(grid.neighbor(11, Direction::Down), None);
        assert_eq!(grid.neighbor(5, Direction::Up), Some(1));
    }

    #[test]
    fn non_square_grid_indexes_by_columns() {
        let grid = grid(2, 5, 100);
        let cell = grid.cell(GridPoint::new(4, 1)).unwrap();
        assert_eq!(cell.position, GridPoint::new(4, 1));
        assert_eq!(cell.window_rect, Rect::new(80, 50, 20, 50));
        assert!(grid.cell(GridPoint::new(5, 0)).is_none());
    }

    #[test]
    fn resolutions_partition_each_space() {
        let mut grid = grid(4, 4, 100);
        grid.set_screen_resolution(400, 200).unwrap();
        let cell = grid.cell(GridPoint::new(2, 3)).unwrap();
        assert_eq!(cell.window_rect, Rect::new(50, 75, 25, 25));
        assert_eq!(cell.screen_rect, Rect::new(200, 150, 100, 50));
        assert_eq!(cell.sample_point(), (50, 75));
        assert_eq!(grid.screen_regions().len(), 9);
    }

    #[test]
    fn view_rect_deactivates_cells_outside_it() {
        let mut grid = grid(4, 4, 100);
        grid.set_mask(Rect::new(0, 0, 50, 100), None).unwrap();
        assert_eq!(grid.active_cell_count(), 8);
        assert!(grid.cell(GridPoint::new(1, 2)).unwrap().active);
        assert!(!grid.cell(GridPoint::new(2, 2)).unwrap().active);
    }

    #[test]
    fn mask_image_hides_cells_with_zero_red() {
        let mut grid = grid(4, 4, 100);
        let mut image = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        image.put_pixel(25, 25, Rgba([0, 255, 255, 255]));
        let mask = MaskImage::from_image(image);
        grid.set_mask(Rect::new(0, 0, 100, 100), Some(&mask)).unwrap();
        assert_eq!(grid.active_cell_count(), 15);
        assert!(!grid.cell(GridPoint::new(1, 1)).unwrap().active);
    }

    #[test]
    fn sample_flags_changed_active_cells() {
        let mut grid = grid(2, 2, 20);
        let dark = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        assert_eq!(grid.sample(&dark, 15).unwrap(), 0);

        let mut lit = dark.clone();
        lit.put_pixel(10, 0, Rgba([80, 0, 0, 255]));
        assert_eq!(grid.sample(&lit, 15).unwrap(), 1);
        assert_eq!(grid.cells()[1].label, CellLabel::Candidate);
        assert_eq!(grid.cells()[0].label, CellLabel::Unassigned);
    }

    #[test]
    fn sampling_outside_the_frame_fails() {
        let mut grid = grid(2, 2, 20);
        let small = RgbaImage::from_pixel(5, 5, Rgba([0, 0, 0, 255]));
        assert!(matches!(
            grid.sample(&small, 15),
            Err(WatchError::SampleOutOfBounds { x: 10, y: 0, .. })
        ));
    }

    #[test]
    fn failed_sample_leaves_history_untouched() {
        let mut grid = grid(2, 2, 20);
        let dark = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        grid.sample(&dark, 15).unwrap();

        // Covers cell (0, 0) but not the others.
        let small = RgbaImage::from_pixel(5, 5, Rgba([90, 0, 0, 255]));
        assert!(grid.sample(&small, 15).is_err());
        assert!(grid.cells().iter().all(|c| c.now_intensity() == Some(0)));

        assert_eq!(grid.sample(&dark, 15).unwrap(), 0);
    }
}
