// THEORY:
// The `tracker` module adds object permanence. The blob detector forgets
// everything between ticks; the `Tracker` keeps a short list of `TrackedBlob`s
// and decides, each tick, which new blob is the continuation of which track.
//
// This module solves the data association problem, deliberately cheaply:
// 1.  **Greedy matching**: tracks are visited in list order. Each one takes the
//     nearest remaining blob whose centre lies strictly within the distance
//     bound. The first track gets first pick, so near-ties can bind sub-optimally;
//     the cost is O(tracks x blobs) and the budget is tiny.
// 2.  **No coasting**: a track that finds no blob this tick is dropped at once.
// 3.  **Birth**: leftover blobs, in the detector's rank order, become new tracks
//     while the budget allows. A newborn's velocity is seeded from the screen
//     region it appeared in, as if it had come from that region's anchor.
// 4.  **Stable output**: the track list keeps its order between ticks apart from
//     removals and appends, and each track keeps the id it was born with.

use crate::core_modules::geometry::{Rect, Vec2};
use crate::core_modules::screen_region::{region_containing, ScreenRegion};
use crate::core_modules::smart_blob::Blob;
use tracing::debug;

/// A blob's identity across ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedBlob {
    /// Persistent id, assigned at birth and never reused.
    pub id: u64,
    /// The blob matched to this track in the most recent tick.
    pub blob: Blob,
    pub center: Vec2,
    /// Screen pixels per millisecond.
    pub velocity: Vec2,
    /// Number of ticks this track has been matched, including its birth.
    pub age: u32,
}

impl TrackedBlob {
    fn new(id: u64, blob: Blob, regions: &[ScreenRegion], elapsed_ms: f64) -> Self {
        let center = blob.center;
        let velocity = match region_containing(regions, center) {
            Some(region) => (center - region.anchor) / elapsed_ms,
            None => Vec2::ZERO,
        };
        Self {
            id,
            blob,
            center,
            velocity,
            age: 1,
        }
    }

    fn update(&mut self, blob: Blob, elapsed_ms: f64) {
        let new_center = blob.center;
        self.velocity = (new_center - self.center) / elapsed_ms;
        self.center = new_center;
        self.blob = blob;
        self.age += 1;
    }

    pub fn bounding_rect(&self) -> Rect {
        self.blob.bounding_rect
    }

    /// True when any of the track's cell rectangles overlaps `rect`.
    pub fn collides_with(&self, rect: &Rect) -> bool {
        self.blob.bounding_rect.intersects(rect) && self.blob.rects.iter().any(|r| r.intersects(rect))
    }
}

/// Manages the list of `TrackedBlob`s from one tick to the next.
pub struct Tracker {
    tracked_blobs: Vec<TrackedBlob>,
    next_id: u64,
    max_tracks: usize,
    max_distance: f64,
}

impl Tracker {
    pub fn new(max_tracks: usize, max_distance: f64) -> Self {
        Self {
            tracked_blobs: Vec::with_capacity(max_tracks),
            next_id: 0,
            max_tracks,
            max_distance,
        }
    }

    pub fn tracked_blobs(&self) -> &[TrackedBlob] {
        &self.tracked_blobs
    }

    pub fn max_tracks(&self) -> usize {
        self.max_tracks
    }

    /// Changes the budget, dropping tracks from the end if it shrank.
    pub fn set_max_tracks(&mut self, max_tracks: usize) {
        self.max_tracks = max_tracks;
        if self.tracked_blobs.len() > max_tracks {
            for lost in self.tracked_blobs.drain(max_tracks..) {
                debug!(track = lost.id, "track dropped by budget change");
            }
        }
    }

    /// Associates this tick's blobs with the live tracks.
    ///
    /// `blobs` must be in detector rank order; `elapsed_ms` must be positive.
    pub fn update(
        &mut self,
        blobs: Vec<Blob>,
        regions: &[ScreenRegion],
        elapsed_ms: f64,
    ) -> &[TrackedBlob] {
        let mut pool = blobs;
        let max_distance = self.max_distance;

        // --- 1. Matching, in track order ---
        self.tracked_blobs.retain_mut(|track| {
            let mut best: Option<(usize, f64)> = None;
            for (index, blob) in pool.iter().enumerate() {
                let distance = track.center.distance(&blob.center);
                let bound = best.map_or(max_distance, |(_, d)| d);
                if distance < bound {
                    best = Some((index, distance));
                }
            }

            match best {
                Some((index, _)) => {
                    track.update(pool.remove(index), elapsed_ms);
                    true
                }
                None => {
                    debug!(track = track.id, age = track.age, "track lost");
                    false
                }
            }
        });

        // --- 2. Birth ---
        for blob in pool {
            if self.tracked_blobs.len() >= self.max_tracks {
                break;
            }
            let track = TrackedBlob::new(self.next_id, blob, regions, elapsed_ms);
            debug!(track = track.id, x = track.center.x, y = track.center.y, "track started");
            self.next_id += 1;
            self.tracked_blobs.push(track);
        }

        &self.tracked_blobs
    }
}
