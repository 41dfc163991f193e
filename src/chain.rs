//! Monotone chain decomposition and envelope queries.
//!
//! A [`MonotoneChain`] is a view over a maximal run of segments of a
//! coordinate sequence whose direction vectors all fall in the same
//! [`Quadrant`]. Monotonicity makes the envelope of any sub-range of
//! the run computable from its two end points, which in turn allows
//! envelope queries ([`MonotoneChain::select`]) and pairwise overlap
//! searches ([`MonotoneChain::compute_overlaps`]) to prune whole
//! sub-ranges by a constant-time test.
//!
//! Build chains with [`monotone_chains`], or index several sequences
//! at once with a [`ChainIndex`].

mod builder;
pub use builder::{monotone_chains, monotone_chains_with_context};

mod index;
pub use index::ChainIndex;

mod quadrant;
pub use quadrant::Quadrant;

use geo::{Coordinate, GeoNum, Line, Rect};

/// A maximal directionally-monotone run of segments of a coordinate
/// sequence.
///
/// The chain borrows the backing slice and describes the run by an
/// inclusive `[start, end]` coordinate index range; it never copies
/// coordinates. The optional `context` (an opaque caller value,
/// defaulting to `()`) travels with the chain so that query callbacks
/// can refer back to the owner of the sequence; the `id` lets callers
/// holding many chains restrict pairwise work to `id_i < id_j`.
///
/// Queries take a closure in place of a visitor object and report
/// candidate segments by their index into the backing slice. They
/// guarantee no false negatives: every segment whose envelope truly
/// intersects the query region is reported. False positives are
/// possible and must be filtered by the caller where exactness is
/// required.
#[derive(Debug, Clone, Copy)]
pub struct MonotoneChain<'a, T: GeoNum, D = ()> {
    coords: &'a [Coordinate<T>],
    start: usize,
    end: usize,
    id: usize,
    context: D,
}

impl<'a, T: GeoNum, D> MonotoneChain<'a, T, D> {
    pub(crate) fn new(
        coords: &'a [Coordinate<T>],
        start: usize,
        end: usize,
        id: usize,
        context: D,
    ) -> Self {
        debug_assert!(start < end && end < coords.len());
        MonotoneChain {
            coords,
            start,
            end,
            id,
            context,
        }
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    /// Index of the chain's first coordinate in the backing slice.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Index of the chain's last coordinate in the backing slice.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn context(&self) -> &D {
        &self.context
    }

    /// The coordinates spanned by this chain.
    pub fn coords(&self) -> &'a [Coordinate<T>] {
        &self.coords[self.start..=self.end]
    }

    /// The segment starting at coordinate index `i` of the backing
    /// slice. Panics if `i` is outside `[start, end - 1]`.
    pub fn line(&self, i: usize) -> Line<T> {
        assert!(self.start <= i && i < self.end);
        Line::new(self.coords[i], self.coords[i + 1])
    }

    /// The chain's envelope, computed from its two end points.
    pub fn envelope(&self) -> Rect<T> {
        Rect::new(self.coords[self.start], self.coords[self.end])
    }

    /// The chain's envelope expanded by `distance` on all sides.
    pub fn envelope_with_expansion(&self, distance: T) -> Rect<T> {
        let env = self.envelope();
        Rect::new(
            Coordinate {
                x: env.min().x - distance,
                y: env.min().y - distance,
            },
            Coordinate {
                x: env.max().x + distance,
                y: env.max().y + distance,
            },
        )
    }

    /// Invoke `action` with every segment of this chain whose envelope
    /// may intersect `search`, identified by its start index into the
    /// backing slice.
    pub fn select<F>(&self, search: &Rect<T>, mut action: F)
    where
        F: FnMut(&Self, usize),
    {
        self.select_range(search, self.start, self.end, &mut action)
    }

    fn select_range<F>(&self, search: &Rect<T>, start0: usize, end0: usize, action: &mut F)
    where
        F: FnMut(&Self, usize),
    {
        // a leaf is a single segment; report it unconditionally
        if end0 - start0 == 1 {
            action(self, start0);
            return;
        }
        // monotonicity: the end points bound the whole sub-range
        if !envelopes_overlap(
            self.coords[start0],
            self.coords[end0],
            search.min(),
            search.max(),
            T::zero(),
        ) {
            return;
        }
        let mid = (start0 + end0) / 2;
        if start0 < mid {
            self.select_range(search, start0, mid, action);
        }
        if mid < end0 {
            self.select_range(search, mid, end0, action);
        }
    }

    /// Invoke `action` with every pair of segments of `self` and
    /// `other` whose envelopes may intersect.
    pub fn compute_overlaps<'b, D2, F>(&self, other: &MonotoneChain<'b, T, D2>, action: F)
    where
        F: FnMut(&Self, usize, &MonotoneChain<'b, T, D2>, usize),
    {
        self.compute_overlaps_with_tolerance(other, T::zero(), action)
    }

    /// As [`compute_overlaps`](Self::compute_overlaps), with the
    /// pruning test widened by `tolerance` on each axis. The widening
    /// applies to the envelope pruning only, not to any exact
    /// intersection test the caller may run on the reported pairs;
    /// it keeps pairs discoverable under snapping or buffering.
    pub fn compute_overlaps_with_tolerance<'b, D2, F>(
        &self,
        other: &MonotoneChain<'b, T, D2>,
        tolerance: T,
        mut action: F,
    ) where
        F: FnMut(&Self, usize, &MonotoneChain<'b, T, D2>, usize),
    {
        self.overlap_ranges(
            self.start,
            self.end,
            other,
            other.start,
            other.end,
            tolerance,
            &mut action,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn overlap_ranges<'b, D2, F>(
        &self,
        start0: usize,
        end0: usize,
        other: &MonotoneChain<'b, T, D2>,
        start1: usize,
        end1: usize,
        tolerance: T,
        action: &mut F,
    ) where
        F: FnMut(&Self, usize, &MonotoneChain<'b, T, D2>, usize),
    {
        if end0 - start0 == 1 && end1 - start1 == 1 {
            action(self, start0, other, start1);
            return;
        }
        if !envelopes_overlap(
            self.coords[start0],
            self.coords[end0],
            other.coords[start1],
            other.coords[end1],
            tolerance,
        ) {
            return;
        }
        let mid0 = (start0 + end0) / 2;
        let mid1 = (start1 + end1) / 2;
        // recurse into every combination of non-trivial half-ranges
        if start0 < mid0 {
            if start1 < mid1 {
                self.overlap_ranges(start0, mid0, other, start1, mid1, tolerance, action);
            }
            if mid1 < end1 {
                self.overlap_ranges(start0, mid0, other, mid1, end1, tolerance, action);
            }
        }
        if mid0 < end0 {
            if start1 < mid1 {
                self.overlap_ranges(mid0, end0, other, start1, mid1, tolerance, action);
            }
            if mid1 < end1 {
                self.overlap_ranges(mid0, end0, other, mid1, end1, tolerance, action);
            }
        }
    }
}

/// Overlap test between the envelope of `(p1, p2)` and the envelope of
/// `(q1, q2)`, widened by `tolerance` on each axis.
fn envelopes_overlap<T: GeoNum>(
    p1: Coordinate<T>,
    p2: Coordinate<T>,
    q1: Coordinate<T>,
    q2: Coordinate<T>,
    tolerance: T,
) -> bool {
    let (min_px, max_px) = min_max(p1.x, p2.x);
    let (min_qx, max_qx) = min_max(q1.x, q2.x);
    if min_px > max_qx + tolerance || max_px < min_qx - tolerance {
        return false;
    }
    let (min_py, max_py) = min_max(p1.y, p2.y);
    let (min_qy, max_qy) = min_max(q1.y, q2.y);
    if min_py > max_qy + tolerance || max_py < min_qy - tolerance {
        return false;
    }
    true
}

fn min_max<T: PartialOrd + Copy>(a: T, b: T) -> (T, T) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;

    use geo::{Coordinate, Rect};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    pub fn init_log() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// A random walk: step lengths and directions vary, so runs of
    /// same-quadrant steps are short and chains stay non-trivial.
    pub fn random_walk(rng: &mut StdRng, len: usize) -> Vec<Coordinate<f64>> {
        let mut pts = Vec::with_capacity(len);
        let mut curr = Coordinate { x: 0., y: 0. };
        pts.push(curr);
        for _ in 1..len {
            curr = Coordinate {
                x: curr.x + rng.gen_range(-1.0..1.0),
                y: curr.y + rng.gen_range(-1.0..1.0),
            };
            pts.push(curr);
        }
        pts
    }

    fn segment_envelope(pts: &[Coordinate<f64>], i: usize) -> Rect<f64> {
        Rect::new(pts[i], pts[i + 1])
    }

    fn rects_intersect(a: &Rect<f64>, b: &Rect<f64>) -> bool {
        envelopes_overlap(a.min(), a.max(), b.min(), b.max(), 0.)
    }

    #[test]
    fn select_reports_no_false_negatives() {
        init_log();
        let mut rng = StdRng::seed_from_u64(42);
        for &len in &[2usize, 3, 10, 100, 500] {
            let pts = random_walk(&mut rng, len);
            let chains = monotone_chains(&pts);
            for _ in 0..50 {
                let c0 = Coordinate {
                    x: rng.gen_range(-10.0..10.0),
                    y: rng.gen_range(-10.0..10.0),
                };
                let c1 = Coordinate {
                    x: c0.x + rng.gen_range(0.0..5.0),
                    y: c0.y + rng.gen_range(0.0..5.0),
                };
                let search = Rect::new(c0, c1);

                let mut visited = HashSet::new();
                for chain in &chains {
                    chain.select(&search, |_, i| {
                        visited.insert(i);
                    });
                }
                for i in 0..pts.len() - 1 {
                    if rects_intersect(&segment_envelope(&pts, i), &search) {
                        assert!(visited.contains(&i), "segment {} missed by select", i);
                    }
                }
            }
        }
    }

    #[test]
    fn compute_overlaps_reports_no_false_negatives() {
        init_log();
        let mut rng = StdRng::seed_from_u64(7);
        let pts0 = random_walk(&mut rng, 200);
        let pts1 = random_walk(&mut rng, 300);
        let chains0 = monotone_chains(&pts0);
        let chains1 = monotone_chains(&pts1);

        let mut visited = HashSet::new();
        for c0 in &chains0 {
            for c1 in &chains1 {
                c0.compute_overlaps(c1, |_, i, _, j| {
                    visited.insert((i, j));
                });
            }
        }
        for i in 0..pts0.len() - 1 {
            for j in 0..pts1.len() - 1 {
                let e0 = segment_envelope(&pts0, i);
                let e1 = segment_envelope(&pts1, j);
                if rects_intersect(&e0, &e1) {
                    assert!(
                        visited.contains(&(i, j)),
                        "overlapping pair ({}, {}) missed",
                        i,
                        j
                    );
                }
            }
        }
    }

    #[test]
    fn tolerance_widens_the_pruning_test() {
        // two horizontal 2-segment chains a vertical gap of 2 apart:
        // pruned by the exact test, fully reported once the tolerance
        // covers the gap
        let pts0: Vec<Coordinate<f64>> =
            vec![(0., 0.).into(), (5., 0.).into(), (10., 0.).into()];
        let pts1: Vec<Coordinate<f64>> =
            vec![(0., 2.).into(), (5., 2.).into(), (10., 2.).into()];
        let chains0 = monotone_chains(&pts0);
        let chains1 = monotone_chains(&pts1);
        assert_eq!((chains0.len(), chains1.len()), (1, 1));

        let mut count = 0;
        chains0[0].compute_overlaps(&chains1[0], |_, _, _, _| count += 1);
        assert_eq!(count, 0);

        chains0[0].compute_overlaps_with_tolerance(&chains1[0], 2.5, |_, _, _, _| count += 1);
        assert_eq!(count, 4);
    }

    #[test]
    fn mutual_leaves_are_reported_unconditionally() {
        // single-segment chains have no interior node to prune at;
        // the (possibly false positive) pair is always reported
        let pts0 = [Coordinate { x: 0., y: 0. }, Coordinate { x: 1., y: 0. }];
        let pts1 = [Coordinate { x: 0., y: 5. }, Coordinate { x: 1., y: 5. }];
        let chains0 = monotone_chains(&pts0);
        let chains1 = monotone_chains(&pts1);

        let mut count = 0;
        chains0[0].compute_overlaps(&chains1[0], |_, _, _, _| count += 1);
        assert_eq!(count, 1);
    }

    #[test]
    fn envelope_expansion() {
        let pts = [Coordinate { x: 1., y: 2. }, Coordinate { x: 3., y: 5. }];
        let chains = monotone_chains(&pts);
        let env = chains[0].envelope_with_expansion(0.5);
        assert_eq!(env.min(), Coordinate { x: 0.5, y: 1.5 });
        assert_eq!(env.max(), Coordinate { x: 3.5, y: 5.5 });
    }

    #[test]
    fn reported_indices_address_the_backing_slice() {
        let pts: Vec<Coordinate<f64>> = vec![
            (0., 0.).into(),
            (1., 1.).into(),
            (2., 0.).into(),
            (3., 1.).into(),
        ];
        let chains = monotone_chains(&pts);
        let search = Rect::new(
            Coordinate { x: -10., y: -10. },
            Coordinate { x: 10., y: 10. },
        );
        for chain in &chains {
            chain.select(&search, |c, i| {
                let line = c.line(i);
                assert_eq!(line.start, pts[i]);
                assert_eq!(line.end, pts[i + 1]);
            });
        }
    }
}
