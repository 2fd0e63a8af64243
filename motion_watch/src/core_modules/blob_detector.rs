// THEORY:
// The `BlobDetector` is the engine of the spatial grouping layer. It takes the
// candidate map the `GridManager` left behind and turns it into a short, ranked
// list of `Blob`s.
//
// Algorithm steps:
// 1.  **Labelling**: candidate cells are visited in grid order. Each candidate
//     that no earlier blob has claimed seeds a scan-line flood fill. The fill pops
//     a cell, climbs to the top of its vertical run of candidates, then walks down
//     the run claiming every cell. While walking, the left and right neighbours
//     are watched: the first candidate of each horizontal "span" is pushed onto
//     the stack, and the span closes again once the neighbour stops being a
//     candidate. Only 4-neighbours are followed, so diagonal contact never merges
//     two blobs, and no claimed cell is visited twice.
// 2.  **Size filtering**: blobs with fewer than `min_size` cells are sensor
//     flicker; blobs with more than `max_size` are whole-frame lighting changes.
//     Both are dropped.
// 3.  **Ranking**: survivors are sorted by size, largest first. The sort is
//     stable, so equal sizes keep their discovery order. The list is cut to the
//     blob budget and each blob's id becomes its rank.
// 4.  **Geometry**: only the surviving blobs get a bounding rect and centre.
//
// The detector itself is stateless. The only state it touches is the per-tick
// label on each cell, which the next sampling pass resets.

use crate::core_modules::cell::CellLabel;
use crate::core_modules::frame::Frame;
use crate::core_modules::grid_manager::{Direction, GridManager};
use crate::core_modules::smart_blob::Blob;
use crate::error::Result;

pub mod blob_detector {
    use super::*;

    /// Size bounds and budget applied to the raw connected components.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlobFilter {
        pub min_size: usize,
        pub max_size: usize,
        pub max_blobs: usize,
    }

    /// Samples `frame` into the grid and extracts the ranked blobs for this tick.
    pub fn extract<F: Frame + ?Sized>(
        grid: &mut GridManager,
        frame: &F,
        threshold: u8,
        filter: &BlobFilter,
    ) -> Result<Vec<Blob>> {
        let candidates = grid.sample(frame, threshold)?;
        if candidates == 0 {
            return Ok(Vec::new());
        }
        Ok(find_blobs(grid, filter))
    }

    /// Groups the grid's current candidate cells into ranked, filtered blobs.
    pub fn find_blobs(grid: &mut GridManager, filter: &BlobFilter) -> Vec<Blob> {
        let mut blobs: Vec<Blob> = Vec::new();
        let mut next_label: u32 = 1;

        for index in 0..grid.cells().len() {
            if !grid.cells()[index].is_candidate() {
                continue;
            }

            let blob = grow_blob(grid, index, next_label);
            next_label += 1;

            let size = blob.size();
            if size >= filter.min_size && size <= filter.max_size {
                blobs.push(blob);
            }
        }

        // `sort_by` is stable: equal sizes stay in discovery order.
        blobs.sort_by(|a, b| b.size().cmp(&a.size()));
        blobs.truncate(filter.max_blobs);

        for (rank, blob) in blobs.iter_mut().enumerate() {
            blob.id = rank;
            blob.calc_geometry();
        }

        blobs
    }

    fn is_candidate(grid: &GridManager, index: Option<usize>) -> bool {
        index.is_some_and(|i| grid.cells()[i].is_candidate())
    }

    /// Scan-line flood fill from `seed`, claiming every reachable candidate with `label`.
    fn grow_blob(grid: &mut GridManager, seed: usize, label: u32) -> Blob {
        let mut blob = Blob::new(0);
        let mut stack = vec![seed];

        while let Some(mut index) = stack.pop() {
            // Climb to the top of this column's run.
            while let Some(up) = grid.neighbor(index, Direction::Up) {
                if !grid.cells()[up].is_candidate() {
                    break;
                }
                index = up;
            }

            let mut span_left = false;
            let mut span_right = false;
            let mut current = Some(index);

            while let Some(i) = current {
                if !grid.cells()[i].is_candidate() {
                    break;
                }

                let cell = &mut grid.cells_mut()[i];
                cell.label = CellLabel::Assigned(label);
                blob.push(cell.position, cell.screen_rect);

                let left = grid.neighbor(i, Direction::Left);
                if is_candidate(grid, left) {
                    if !span_left {
                        stack.extend(left);
                        span_left = true;
                    }
                } else if left.is_some() {
                    span_left = false;
                }

                let right = grid.neighbor(i, Direction::Right);
                if is_candidate(grid, right) {
                    if !span_right {
                        stack.extend(right);
                        span_right = true;
                    }
                } else if right.is_some() {
                    span_right = false;
                }

                current = grid.neighbor(i, Direction::Down);
            }
        }

        blob
    }
}

#[cfg(test)]
mod tests {
    use super::blob_detector::{extract, find_blobs, BlobFilter};
    use super::*;
    use crate::core_modules::geometry::{GridPoint, Rect};
    use image::{Rgba, RgbaImage};
    use std::collections::HashSet;

    const CELL: u32 = 10;

    fn make_grid(rows: usize, cols: usize) -> GridManager {
        let mut grid = GridManager::new(rows, cols).unwrap();
        grid.set_window_resolution(cols as u32 * CELL, rows as u32 * CELL).unwrap();
        grid.set_screen_resolution(cols as u32 * CELL, rows as u32 * CELL).unwrap();
        grid
    }

    fn filter(max_blobs: usize) -> BlobFilter {
        BlobFilter {
            min_size: 1,
            max_size: 1000,
            max_blobs,
        }
    }

    /// Primes the grid with a dark frame, then lights the given cells.
    fn detect(grid: &mut GridManager, lit: &[(usize, usize)], filter: &BlobFilter) -> Vec<Blob> {
        let width = grid.cols() as u32 * CELL;
        let height = grid.rows() as u32 * CELL;
        let dark = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        assert!(extract(grid, &dark, 15, filter).unwrap().is_empty());

        let mut frame = dark.clone();
        for &(col, row) in lit {
            frame.put_pixel(col as u32 * CELL, row as u32 * CELL, Rgba([50, 0, 0, 255]));
        }
        extract(grid, &frame, 15, filter).unwrap()
    }

    fn block(col: usize, row: usize, w: usize, h: usize) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for r in row..row + h {
            for c in col..col + w {
                cells.push((c, r));
            }
        }
        cells
    }

    #[test]
    fn three_by_three_block_is_one_blob() {
        let mut grid = make_grid(25, 25);
        let blobs = detect(&mut grid, &block(5, 5, 3, 3), &BlobFilter { min_size: 4, max_size: 80, max_blobs: 2 });
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].size(), 9);
        assert_eq!(blobs[0].bounding_rect, Rect::new(50, 50, 30, 30));
        assert_eq!(blobs[0].center.x, 65.0);
        assert_eq!(blobs[0].id, 0);
    }

    #[test]
    fn diagonal_contact_does_not_merge() {
        let mut grid = make_grid(6, 6);
        let blobs = detect(&mut grid, &[(1, 1), (2, 2)], &filter(10));
        assert_eq!(blobs.len(), 2);
        assert!(blobs.iter().all(|b| b.size() == 1));
    }

    #[test]
    fn u_shape_is_filled_through_both_arms() {
        // X . X
        // X . X
        // X X X
        let lit = [(0, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)];
        let mut grid = make_grid(5, 5);
        let blobs = detect(&mut grid, &lit, &filter(10));
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].size(), 7);
    }

    #[test]
    fn comb_shape_opens_a_span_per_tooth() {
        // X X X X X
        // X . X . X
        // X . X . X
        let mut lit = block(0, 0, 5, 1);
        lit.extend([(0, 1), (0, 2), (2, 1), (2, 2), (4, 1), (4, 2)]);
        let mut grid = make_grid(5, 5);
        let blobs = detect(&mut grid, &lit, &filter(10));
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].size(), 11);
        let unique: HashSet<_> = blobs[0].cells.iter().collect();
        assert_eq!(unique.len(), 11);
    }

    #[test]
    fn larger_blob_wins_the_budget() {
        let mut lit = block(0, 0, 5, 1);
        lit.extend(block(0, 5, 3, 2));
        let mut grid = make_grid(10, 10);
        let blobs = detect(&mut grid, &lit, &BlobFilter { min_size: 4, max_size: 80, max_blobs: 1 });
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].size(), 6);
        assert_eq!(blobs[0].cells[0].row, 5);
    }

    #[test]
    fn equal_sizes_keep_discovery_order() {
        let mut lit = block(6, 0, 2, 2);
        lit.extend(block(0, 6, 2, 2));
        let mut grid = make_grid(10, 10);
        let blobs = detect(&mut grid, &lit, &filter(2));
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].cells[0], GridPoint::new(6, 0));
        assert_eq!(blobs[1].cells[0], GridPoint::new(0, 6));
        assert_eq!(blobs[1].id, 1);
    }

    #[test]
    fn size_bounds_drop_flicker_and_floods() {
        let mut lit = vec![(0, 0), (1, 0)];
        lit.extend(block(4, 4, 4, 4));
        let mut grid = make_grid(10, 10);
        let bounds = BlobFilter {
            min_size: 4,
            max_size: 10,
            max_blobs: 5,
        };
        assert!(detect(&mut grid, &lit, &bounds).is_empty());

        let mut grid = make_grid(10, 10);
        let bounds = BlobFilter {
            min_size: 2,
            max_size: 16,
            max_blobs: 5,
        };
        let sizes: Vec<usize> = detect(&mut grid, &lit, &bounds).iter().map(Blob::size).collect();
        assert_eq!(sizes, vec![16, 2]);
    }

    #[test]
    fn masked_cells_never_join_a_blob() {
        let mut grid = make_grid(6, 6);
        grid.set_mask(Rect::new(0, 0, 30, 60), None).unwrap();
        let blobs = detect(&mut grid, &block(1, 1, 4, 1), &filter(5));
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].size(), 2);
        assert!(blobs[0].cells.iter().all(|p| p.col < 3));
    }

    #[test]
    fn labels_record_membership() {
        let mut grid = make_grid(4, 4);
        detect(&mut grid, &block(0, 0, 2, 1), &filter(2));
        assert_eq!(grid.cells()[0].label, CellLabel::Assigned(1));
        assert_eq!(grid.cells()[1].label, CellLabel::Assigned(1));
        assert_eq!(grid.cells()[2].label, CellLabel::Unassigned);
    }

    #[test]
    fn find_blobs_without_candidates_is_empty() {
        let mut grid = make_grid(3, 3);
        assert!(find_blobs(&mut grid, &filter(3)).is_empty());
    }
}
