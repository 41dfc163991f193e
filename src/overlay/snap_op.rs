use geo::Geometry;
use log::trace;

use super::{OpType, OverlayEngine, OverlayError};
use crate::precision::{CommonBitsRemover, PrecisionModel};
use crate::snap::GeometrySnapper;

/// Overlay with unconditional input conditioning.
///
/// Two compounding causes of robustness failure are addressed before
/// the engine ever runs: mantissa bits shared by every coordinate of
/// the pair are removed (subtracting numbers that agree in their
/// leading bits loses exactly those bits of precision), and
/// near-coincident vertices and edges are snapped together (they make
/// orientation signs numerically ambiguous). The removed bits are
/// restored into the result, so conditioning is invisible to the
/// caller.
///
/// The caller's geometries are never touched: conditioning operates
/// on translated copies.
pub struct SnapOverlay<'e, E> {
    engine: &'e E,
    precision: PrecisionModel,
}

impl<'e, E: OverlayEngine> SnapOverlay<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        SnapOverlay {
            engine,
            precision: PrecisionModel::default(),
        }
    }

    /// Declare the precision model of the inputs; a fixed model
    /// raises the snap tolerance to at least the grid coarseness.
    pub fn with_precision(mut self, precision: PrecisionModel) -> Self {
        self.precision = precision;
        self
    }

    /// Compute `op` over `(g0, g1)` on conditioned copies of the
    /// inputs, restoring the removed common bits into the result.
    pub fn result_geometry(
        &self,
        g0: &Geometry<f64>,
        g1: &Geometry<f64>,
        op: OpType,
    ) -> Result<Geometry<f64>, OverlayError> {
        let tolerance = self.snap_tolerance(g0, g1);
        trace!("snap overlay with tolerance {tolerance}");

        let mut cbr = CommonBitsRemover::new();
        cbr.add(g0);
        cbr.add(g1);
        let translated0 = cbr.remove_common_bits(g0);
        let translated1 = cbr.remove_common_bits(g1);

        let (snapped0, snapped1) = GeometrySnapper::snap(&translated0, &translated1, tolerance);

        let mut result = self.engine.overlay(&snapped0, &snapped1, op)?;
        cbr.add_common_bits(&mut result);
        Ok(result)
    }

    fn snap_tolerance(&self, g0: &Geometry<f64>, g1: &Geometry<f64>) -> f64 {
        GeometrySnapper::overlay_snap_tolerance_for_pair(g0, g1)
            .max(self.precision.snap_tolerance_floor())
    }
}
