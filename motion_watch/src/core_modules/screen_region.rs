// THEORY:
// Screen regions split the screen into a 3x3 layout of zones: four corners, four
// edge bands and the centre. Corners and side bands are a quarter of the screen
// wide; the centre column is half. They exist for one purpose: when a blob
// appears for the first time, the zone it appears in tells us where it most
// likely entered from. The zone's anchor (the matching corner, edge midpoint or
// centre) is treated as its previous position, which gives a brand-new track a
// plausible initial velocity instead of a standstill.

use crate::core_modules::geometry::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    TopLeft,
    MidLeft,
    BottomLeft,
    TopRight,
    MidRight,
    BottomRight,
    TopCenter,
    MidCenter,
    BottomCenter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenRegion {
    pub kind: RegionKind,
    pub rect: Rect,
    /// The point a blob first seen in this region is assumed to have come from.
    pub anchor: Vec2,
    /// Display colour for consumers that visualise the layout.
    pub color: [u8; 3],
}

impl ScreenRegion {
    fn new(kind: RegionKind, rect: Rect, anchor: Vec2, color: [u8; 3]) -> Self {
        Self {
            kind,
            rect,
            anchor,
            color,
        }
    }
}

/// Builds the nine regions for a screen of the given size, in lookup order.
pub fn build_screen_regions(width: i32, height: i32) -> Vec<ScreenRegion> {
    let (w4, w2, w34) = (width / 4, width / 2, 3 * width / 4);
    let (h4, h2, h34) = (height / 4, height / 2, 3 * height / 4);

    let top_left = Rect::new(0, 0, w4, h4);
    let mid_left = Rect::new(0, h4, w4, h2);
    let bottom_left = Rect::new(0, h34, w4, h4);

    let top_right = Rect::new(w34, 0, w4, h4);
    let mid_right = Rect::new(w34, h4, w4, h2);
    let bottom_right = Rect::new(w34, h34, w4, h4);

    let top_center = Rect::new(w4, 0, w2, h4);
    let mid_center = Rect::new(w4, h4, w2, h2);
    let bottom_center = Rect::new(w4, h34, w2, h4);

    vec![
        ScreenRegion::new(RegionKind::TopLeft, top_left, top_left.top_left(), [50, 0, 0]),
        ScreenRegion::new(RegionKind::MidLeft, mid_left, mid_left.mid_left(), [100, 0, 0]),
        ScreenRegion::new(RegionKind::BottomLeft, bottom_left, bottom_left.bottom_left(), [200, 0, 0]),
        ScreenRegion::new(RegionKind::TopRight, top_right, top_right.top_right(), [0, 50, 0]),
        ScreenRegion::new(RegionKind::MidRight, mid_right, mid_right.mid_right(), [0, 100, 0]),
        ScreenRegion::new(RegionKind::BottomRight, bottom_right, bottom_right.bottom_right(), [0, 200, 0]),
        ScreenRegion::new(RegionKind::TopCenter, top_center, top_center.mid_top(), [0, 0, 50]),
        ScreenRegion::new(RegionKind::MidCenter, mid_center, mid_center.center(), [0, 0, 100]),
        ScreenRegion::new(RegionKind::BottomCenter, bottom_center, bottom_center.mid_bottom(), [0, 0, 200]),
    ]
}

/// The first region whose rectangle contains `point`.
pub fn region_containing(regions: &[ScreenRegion], point: Vec2) -> Option<&ScreenRegion> {
    regions.iter().find(|region| region.rect.contains_point(point))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_regions_tile_a_divisible_screen() {
        let regions = build_screen_regions(400, 400);
        assert_eq!(regions.len(), 9);
        let area: i32 = regions.iter().map(|r| r.rect.width * r.rect.height).sum();
        assert_eq!(area, 400 * 400);
    }

    #[test]
    fn corners_anchor_on_screen_corners() {
        let regions = build_screen_regions(400, 200);
        let find = |kind| regions.iter().find(|r| r.kind == kind).unwrap();
        assert_eq!(find(RegionKind::TopLeft).anchor, Vec2::new(0.0, 0.0));
        assert_eq!(find(RegionKind::BottomRight).anchor, Vec2::new(400.0, 200.0));
        assert_eq!(find(RegionKind::MidLeft).anchor, Vec2::new(0.0, 100.0));
        assert_eq!(find(RegionKind::MidCenter).anchor, Vec2::new(200.0, 100.0));
        assert_eq!(find(RegionKind::BottomCenter).anchor, Vec2::new(200.0, 200.0));
    }

    #[test]
    fn lookup_picks_the_zone_under_the_point() {
        let regions = build_screen_regions(400, 400);
        let hit = region_containing(&regions, Vec2::new(390.0, 10.0)).unwrap();
        assert_eq!(hit.kind, RegionKind::TopRight);
        let hit = region_containing(&regions, Vec2::new(200.0, 200.0)).unwrap();
        assert_eq!(hit.kind, RegionKind::MidCenter);
        assert!(region_containing(&regions, Vec2::new(400.0, 10.0)).is_none());
    }
}
