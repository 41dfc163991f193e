use geo::euclidean_distance::EuclideanDistance;
use geo::{Coordinate, GeoFloat, Line, Point};
use itertools::Itertools;
use log::trace;
use smallvec::SmallVec;

const SNAP_STACK_SIZE: usize = 16;
type WorkingCoords<T> = SmallVec<[Coordinate<T>; SNAP_STACK_SIZE]>;

/// Snaps the coordinate sequence of one line or ring onto a set of
/// target points.
///
/// Snapping happens in two phases. First, every source vertex within
/// tolerance of a target is replaced by the target coordinate (a
/// bit-exact copy, never an interpolated value). Second, each target
/// not already coincident with a source vertex "cracks" the single
/// closest source segment within tolerance, inserting the target
/// immediately after the segment's start. Insertions are applied to
/// the working list at once, so later targets see the updated
/// segments.
///
/// The source slice is never mutated; [`snap_to`](Self::snap_to)
/// returns a new sequence. Sources of fewer than 2 points are
/// undefined input.
pub struct LineStringSnapper<'a, T: GeoFloat> {
    src_pts: &'a [Coordinate<T>],
    snap_tolerance: T,
    is_closed: bool,
    snap_to_source_vertices: bool,
}

impl<'a, T: GeoFloat> LineStringSnapper<'a, T> {
    pub fn new(src_pts: &'a [Coordinate<T>], snap_tolerance: T) -> Self {
        debug_assert!(
            src_pts.len() >= 2,
            "snapping a sequence of fewer than 2 points is undefined"
        );
        LineStringSnapper {
            src_pts,
            snap_tolerance,
            is_closed: is_closed(src_pts),
            snap_to_source_vertices: false,
        }
    }

    /// Let a target coincident with a source vertex still crack
    /// nearby segments (it is skipped entirely by default). Used when
    /// the targets are the source's own vertices.
    pub fn allow_snapping_to_source_vertices(mut self, allow: bool) -> Self {
        self.snap_to_source_vertices = allow;
        self
    }

    /// Snap the source sequence to `snap_pts` and return the new
    /// sequence.
    pub fn snap_to(&self, snap_pts: &[Coordinate<T>]) -> Vec<Coordinate<T>> {
        let mut coords = WorkingCoords::from_slice(self.src_pts);
        self.snap_vertices(&mut coords, snap_pts);
        self.snap_segments(&mut coords, snap_pts);
        coords.into_vec()
    }

    fn snap_vertices(&self, coords: &mut WorkingCoords<T>, snap_pts: &[Coordinate<T>]) {
        // a ring's closing coordinate is kept out of the scan and
        // rewritten together with vertex 0
        let end = if self.is_closed {
            coords.len() - 1
        } else {
            coords.len()
        };
        for i in 0..end {
            if let Some(snap) = self.find_snap_for_vertex(coords[i], snap_pts) {
                trace!("vertex {i}: {from:?} -> {snap:?}", from = coords[i]);
                coords[i] = snap;
                if i == 0 && self.is_closed {
                    let last = coords.len() - 1;
                    coords[last] = snap;
                }
            }
        }
    }

    fn find_snap_for_vertex(
        &self,
        pt: Coordinate<T>,
        snap_pts: &[Coordinate<T>],
    ) -> Option<Coordinate<T>> {
        // a vertex coinciding with any target is already snapped
        if snap_pts.iter().any(|&snap| snap == pt) {
            return None;
        }
        snap_pts
            .iter()
            .copied()
            .find(|&snap| distance(pt, snap) < self.snap_tolerance)
    }

    fn snap_segments(&self, coords: &mut WorkingCoords<T>, snap_pts: &[Coordinate<T>]) {
        if snap_pts.is_empty() {
            return;
        }
        // targets sourced from a ring repeat the closing point
        let mut distinct = snap_pts.len();
        if distinct > 1 && snap_pts[0] == snap_pts[snap_pts.len() - 1] {
            distinct -= 1;
        }
        for &snap_pt in &snap_pts[..distinct] {
            if let Some(index) = self.find_segment_to_snap(snap_pt, coords) {
                trace!("cracking segment {index} at {snap_pt:?}");
                insert_unless_repeated(coords, index + 1, snap_pt);
            }
        }
    }

    /// Index of the source segment closest to `snap_pt` among those
    /// strictly within tolerance. A target coinciding with any
    /// current source vertex is no crack site at all; only one
    /// segment may ever be cracked per target.
    fn find_segment_to_snap(
        &self,
        snap_pt: Coordinate<T>,
        coords: &WorkingCoords<T>,
    ) -> Option<usize> {
        let mut best: Option<(usize, T)> = None;
        for (i, (&p0, &p1)) in coords.iter().tuple_windows().enumerate() {
            if p0 == snap_pt || p1 == snap_pt {
                if self.snap_to_source_vertices {
                    continue;
                }
                return None;
            }
            let dist = Point::from(snap_pt).euclidean_distance(&Line::new(p0, p1));
            if dist < self.snap_tolerance && best.map_or(true, |(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }
        best.map(|(i, _)| i)
    }
}

fn is_closed<T: GeoFloat>(pts: &[Coordinate<T>]) -> bool {
    pts.len() > 1 && pts[0] == pts[pts.len() - 1]
}

fn distance<T: GeoFloat>(a: Coordinate<T>, b: Coordinate<T>) -> T {
    Point::from(a).euclidean_distance(&Point::from(b))
}

fn insert_unless_repeated<T: GeoFloat>(
    coords: &mut WorkingCoords<T>,
    index: usize,
    pt: Coordinate<T>,
) {
    // guard against creating zero-length segments next to the
    // insertion point
    if coords[index - 1] == pt || (index < coords.len() && coords[index] == pt) {
        return;
    }
    coords.insert(index, pt);
}
