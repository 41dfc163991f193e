//! Snapping of one geometry's vertices and segments onto another
//! geometry's vertex set.
//!
//! Snapping replaces near-coincident coordinates between two
//! geometries with exactly coincident ones, which removes the
//! ill-conditioned orientation tests that make overlay computations
//! fail. [`GeometrySnapper`] drives whole geometries;
//! [`LineStringSnapper`] does the per-sequence work.

mod line_snapper;
pub use line_snapper::LineStringSnapper;

use geo::bounding_rect::BoundingRect;
use geo::coords_iter::CoordsIter;
use geo::{
    Coordinate, GeoFloat, Geometry, GeometryCollection, LineString, MultiLineString, MultiPolygon,
    Polygon,
};
use log::debug;

/// Factor relating the size of the input geometries to the snap
/// tolerance used for overlay conditioning.
const SNAP_PRECISION_FACTOR: f64 = 1e-4;

/// Snaps the vertices and segments of a source geometry to the
/// vertices of a target geometry, producing a structurally modified
/// copy. The source is never mutated.
pub struct GeometrySnapper<'a, T: GeoFloat> {
    src: &'a Geometry<T>,
}

impl<'a, T: GeoFloat> GeometrySnapper<'a, T> {
    pub fn new(src: &'a Geometry<T>) -> Self {
        GeometrySnapper { src }
    }

    /// Snap tolerance to condition `g` for an overlay computation: a
    /// small fraction of the smaller dimension of its envelope. Zero
    /// for an empty geometry.
    pub fn overlay_snap_tolerance(g: &Geometry<T>) -> T {
        match g.bounding_rect() {
            Some(env) => {
                let min_dimension = if env.width() < env.height() {
                    env.width()
                } else {
                    env.height()
                };
                min_dimension * T::from(SNAP_PRECISION_FACTOR).unwrap()
            }
            None => T::zero(),
        }
    }

    /// Snap tolerance for overlaying the pair `(g0, g1)`: the smaller
    /// of the two individual tolerances.
    pub fn overlay_snap_tolerance_for_pair(g0: &Geometry<T>, g1: &Geometry<T>) -> T {
        let t0 = Self::overlay_snap_tolerance(g0);
        let t1 = Self::overlay_snap_tolerance(g1);
        if t0 < t1 {
            t0
        } else {
            t1
        }
    }

    /// Snap `g0` and `g1` to each other.
    ///
    /// `g0` is snapped to `g1`'s vertices first, then `g1` is snapped
    /// to the vertices of the *already snapped* `g0`. The asymmetry
    /// minimizes the number of distinct coordinate values in the
    /// result pair, which keeps the snap from introducing fresh
    /// near-coincidences of its own.
    pub fn snap(
        g0: &Geometry<T>,
        g1: &Geometry<T>,
        tolerance: T,
    ) -> (Geometry<T>, Geometry<T>) {
        let snapped0 = GeometrySnapper::new(g0).snap_to(g1, tolerance);
        let snapped1 = GeometrySnapper::new(g1).snap_to(&snapped0, tolerance);
        (snapped0, snapped1)
    }

    /// Snap the source to the vertices of `snap_geom`.
    pub fn snap_to(&self, snap_geom: &Geometry<T>, tolerance: T) -> Geometry<T> {
        let snap_pts = extract_target_coordinates(snap_geom);
        self.snap_to_points(&snap_pts, tolerance)
    }

    /// Snap the source to an explicit target point set. The targets
    /// are scanned in the order given; [`extract_target_coordinates`]
    /// produces the canonical ordering.
    pub fn snap_to_points(&self, snap_pts: &[Coordinate<T>], tolerance: T) -> Geometry<T> {
        debug!(
            "snapping with tolerance {tolerance:?} to {n} target points",
            n = snap_pts.len()
        );
        snap_geometry(self.src, snap_pts, tolerance)
    }
}

/// The deduplicated vertex set of `g`, sorted lexicographically by
/// `x` then `y`. The ordering fixes which target a vertex snaps to
/// when several are within tolerance.
pub fn extract_target_coordinates<T: GeoFloat>(g: &Geometry<T>) -> Vec<Coordinate<T>> {
    let mut pts: Vec<_> = g.coords_iter().collect();
    pts.sort_unstable_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap()
            .then_with(|| a.y.partial_cmp(&b.y).unwrap())
    });
    pts.dedup();
    pts
}

/// Rebuild `g` with every line-typed coordinate sequence snapped.
/// Points pass through untouched; a `Line` widens to a `LineString`
/// since cracking may add vertices; `Rect` and `Triangle` are
/// polygonized first.
fn snap_geometry<T: GeoFloat>(
    g: &Geometry<T>,
    snap_pts: &[Coordinate<T>],
    tolerance: T,
) -> Geometry<T> {
    match g {
        Geometry::Point(_) | Geometry::MultiPoint(_) => g.clone(),
        Geometry::Line(l) => {
            let ls = LineString(vec![l.start, l.end]);
            Geometry::LineString(snap_line_string(&ls, snap_pts, tolerance))
        }
        Geometry::LineString(ls) => {
            Geometry::LineString(snap_line_string(ls, snap_pts, tolerance))
        }
        Geometry::Polygon(p) => Geometry::Polygon(snap_polygon(p, snap_pts, tolerance)),
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString(
            mls.0
                .iter()
                .map(|ls| snap_line_string(ls, snap_pts, tolerance))
                .collect(),
        )),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon(
            mp.0.iter()
                .map(|p| snap_polygon(p, snap_pts, tolerance))
                .collect(),
        )),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection(
            gc.0.iter()
                .map(|g| snap_geometry(g, snap_pts, tolerance))
                .collect(),
        )),
        Geometry::Rect(r) => {
            Geometry::Polygon(snap_polygon(&r.to_polygon(), snap_pts, tolerance))
        }
        Geometry::Triangle(t) => {
            Geometry::Polygon(snap_polygon(&t.to_polygon(), snap_pts, tolerance))
        }
    }
}

fn snap_line_string<T: GeoFloat>(
    ls: &LineString<T>,
    snap_pts: &[Coordinate<T>],
    tolerance: T,
) -> LineString<T> {
    if ls.0.len() < 2 {
        return ls.clone();
    }
    LineString(LineStringSnapper::new(&ls.0, tolerance).snap_to(snap_pts))
}

fn snap_polygon<T: GeoFloat>(
    p: &Polygon<T>,
    snap_pts: &[Coordinate<T>],
    tolerance: T,
) -> Polygon<T> {
    let exterior = snap_line_string(p.exterior(), snap_pts, tolerance);
    let interiors = p
        .interiors()
        .iter()
        .map(|ring| snap_line_string(ring, snap_pts, tolerance))
        .collect();
    Polygon::new(exterior, interiors)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::{polygon, Rect};

    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry<f64> {
        Rect::new((x0, y0), (x1, y1)).to_polygon().into()
    }

    #[test]
    fn overlay_tolerance_scales_with_the_smaller_dimension() {
        let g = square(0., 0., 100., 10.);
        assert_relative_eq!(GeometrySnapper::overlay_snap_tolerance(&g), 10. * 1e-4);

        let pair_tol = GeometrySnapper::overlay_snap_tolerance_for_pair(
            &g,
            &square(0., 0., 1., 1.),
        );
        assert_relative_eq!(pair_tol, 1e-4);
    }

    #[test]
    fn empty_geometry_has_zero_tolerance() {
        let g: Geometry<f64> = Geometry::GeometryCollection(GeometryCollection(vec![]));
        assert_eq!(GeometrySnapper::overlay_snap_tolerance(&g), 0.);
    }

    #[test]
    fn target_extraction_is_sorted_and_deduplicated() {
        let g: Geometry<f64> = polygon![
            (x: 1., y: 1.),
            (x: 0., y: 1.),
            (x: 0., y: 0.),
            (x: 1., y: 0.),
        ]
        .into();
        let targets = extract_target_coordinates(&g);
        let expected: Vec<Coordinate<f64>> =
            vec![(0., 0.).into(), (0., 1.).into(), (1., 0.).into(), (1., 1.).into()];
        assert_eq!(targets, expected);
    }

    #[test]
    fn snap_to_itself_is_a_noop() {
        let g = square(0., 0., 10., 10.);
        for &tol in &[0., 1e-6, 0.5, 1000.] {
            let (s0, s1) = GeometrySnapper::snap(&g, &g, tol);
            let original: Vec<_> = g.coords_iter().collect();
            assert_eq!(s0.coords_iter().collect::<Vec<_>>(), original);
            assert_eq!(s1.coords_iter().collect::<Vec<_>>(), original);
        }
    }

    #[test]
    fn second_input_snaps_to_the_already_snapped_first() {
        // a's vertex is pulled onto b's; b then sees an exactly
        // coincident vertex and stays put, so one coordinate value
        // serves both outputs
        let a: Geometry<f64> =
            Geometry::LineString(LineString(vec![(0., 0.).into(), (10., 10.).into()]));
        let b: Geometry<f64> = Geometry::LineString(LineString(vec![
            (0., 0.001).into(),
            (10., 10.001).into(),
        ]));
        let (sa, sb) = GeometrySnapper::snap(&a, &b, 0.01);
        let sa_pts: Vec<_> = sa.coords_iter().collect();
        let sb_pts: Vec<_> = sb.coords_iter().collect();
        assert_eq!(sa_pts, sb_pts);
        assert_eq!(sa_pts[0], Coordinate { x: 0., y: 0.001 });
        assert_eq!(sa_pts[1], Coordinate { x: 10., y: 10.001 });
    }

    #[test]
    fn polygon_rings_are_snapped_and_stay_closed() {
        let g0 = square(0., 0., 10., 10.);
        let g1 = square(10.000_01, 0., 20., 10.);
        let (s0, _) = GeometrySnapper::snap(&g0, &g1, 0.001);
        let p0 = match s0 {
            Geometry::Polygon(p) => p,
            other => panic!("expected a polygon, got {:?}", other),
        };
        assert!(p0.exterior().is_closed());
        // the shared edge collapsed onto g1's x
        assert!(p0
            .exterior()
            .0
            .iter()
            .any(|c| c.x == 10.000_01));
        assert!(p0.exterior().0.iter().all(|c| c.x != 10.));
    }

    #[test]
    fn line_widens_to_line_string_when_cracked() {
        let src: Geometry<f64> =
            Geometry::Line(geo::Line::new((0., 0.), (10., 0.)));
        let target: Geometry<f64> = Geometry::Point((5., 0.0001).into());
        let snapped = GeometrySnapper::new(&src).snap_to(&target, 0.01);
        match snapped {
            Geometry::LineString(ls) => {
                assert_eq!(
                    ls.0,
                    vec![
                        Coordinate { x: 0., y: 0. },
                        Coordinate { x: 5., y: 0.0001 },
                        Coordinate { x: 10., y: 0. },
                    ]
                );
            }
            other => panic!("expected a line string, got {:?}", other),
        }
    }
}
