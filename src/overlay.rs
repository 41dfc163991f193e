//! Snap-retry orchestration of overlay (boolean set) operations.
//!
//! The overlay algorithm itself lives behind the [`OverlayEngine`]
//! trait; this module makes its invocations robust. The entry point
//! is [`SnapIfNeededOverlay`]: run the engine directly on the
//! unmodified inputs, and only when that fails condition the inputs
//! (common-bit removal followed by snapping, see [`SnapOverlay`]) and
//! try once more. If the conditioned attempt fails too, the *first*
//! failure is surfaced: it carries the diagnostics of the true input
//! coordinates, before any transformation.
//!
//! Both stages are heuristics. They lower the failure probability
//! without a formal guarantee, which is why the direct attempt always
//! goes first.

mod snap_op;
pub use snap_op::SnapOverlay;

use geo::Geometry;
use log::debug;
use thiserror::Error;

use crate::precision::PrecisionModel;

/// A boolean set operation on a pair of geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpType {
    Intersection,
    Union,
    Difference,
    /// Symmetric difference.
    Xor,
}

/// Failure of an overlay computation.
#[derive(Debug, Clone, Error)]
pub enum OverlayError {
    /// The engine could not build a consistent topology from the
    /// noded edges, typically because a robustness failure placed an
    /// intersection inconsistently.
    #[error("overlay topology could not be constructed: {0}")]
    Topology(String),

    /// Malformed input, such as an unsupported geometry or operation.
    #[error("invalid overlay input: {0}")]
    InvalidInput(String),

    /// The result was rejected by a configured result validator.
    #[error("overlay result failed validation")]
    InvalidResult,
}

impl OverlayError {
    /// Whether the snap-enhanced fallback may be attempted for this
    /// failure. Invalid inputs fail fast: snapping cannot repair
    /// them, and retrying would only mask the caller's error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OverlayError::Topology(_) | OverlayError::InvalidResult
        )
    }
}

/// The external overlay algorithm: builds the boolean-set result of
/// two geometries, or fails with a topology-construction error when
/// graph noding cannot resolve an intersection.
///
/// Implemented for any closure with the matching signature, which is
/// also the easiest way to adapt an existing algorithm.
pub trait OverlayEngine {
    fn overlay(
        &self,
        g0: &Geometry<f64>,
        g1: &Geometry<f64>,
        op: OpType,
    ) -> Result<Geometry<f64>, OverlayError>;
}

impl<F> OverlayEngine for F
where
    F: Fn(&Geometry<f64>, &Geometry<f64>, OpType) -> Result<Geometry<f64>, OverlayError>,
{
    fn overlay(
        &self,
        g0: &Geometry<f64>,
        g1: &Geometry<f64>,
        op: OpType,
    ) -> Result<Geometry<f64>, OverlayError> {
        self(g0, g1, op)
    }
}

/// Validity check applied to the direct path's result when installed.
pub type ResultValidator = Box<dyn Fn(&Geometry<f64>) -> bool>;

/// Overlay two geometries, falling back to snapping only when the
/// direct computation fails.
pub struct SnapIfNeededOverlay<E> {
    engine: E,
    precision: PrecisionModel,
    validator: Option<ResultValidator>,
}

impl<E: OverlayEngine> SnapIfNeededOverlay<E> {
    pub fn new(engine: E) -> Self {
        SnapIfNeededOverlay {
            engine,
            precision: PrecisionModel::default(),
            validator: None,
        }
    }

    /// Declare the precision model of the inputs; a fixed model
    /// raises the fallback's snap tolerance to the grid coarseness.
    pub fn with_precision(mut self, precision: PrecisionModel) -> Self {
        self.precision = precision;
        self
    }

    /// Install a validity check on the direct path's result; a
    /// rejected result is treated like a retryable failure. Off by
    /// default: the check costs a full pass over the result, and
    /// accepted practice is to trust the engine's own noding
    /// validation instead.
    pub fn with_result_validator(mut self, validator: ResultValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn intersection(
        &self,
        g0: &Geometry<f64>,
        g1: &Geometry<f64>,
    ) -> Result<Geometry<f64>, OverlayError> {
        self.result_geometry(g0, g1, OpType::Intersection)
    }

    pub fn union(
        &self,
        g0: &Geometry<f64>,
        g1: &Geometry<f64>,
    ) -> Result<Geometry<f64>, OverlayError> {
        self.result_geometry(g0, g1, OpType::Union)
    }

    pub fn difference(
        &self,
        g0: &Geometry<f64>,
        g1: &Geometry<f64>,
    ) -> Result<Geometry<f64>, OverlayError> {
        self.result_geometry(g0, g1, OpType::Difference)
    }

    pub fn sym_difference(
        &self,
        g0: &Geometry<f64>,
        g1: &Geometry<f64>,
    ) -> Result<Geometry<f64>, OverlayError> {
        self.result_geometry(g0, g1, OpType::Xor)
    }

    /// Compute `op` over `(g0, g1)`: direct first, snap-enhanced on a
    /// retryable failure, surfacing the direct failure if both fail.
    pub fn result_geometry(
        &self,
        g0: &Geometry<f64>,
        g1: &Geometry<f64>,
        op: OpType,
    ) -> Result<Geometry<f64>, OverlayError> {
        let saved = match self.engine.overlay(g0, g1, op) {
            Ok(result) => match &self.validator {
                Some(validator) if !validator(&result) => OverlayError::InvalidResult,
                _ => return Ok(result),
            },
            Err(err) if err.is_retryable() => err,
            Err(err) => return Err(err),
        };
        debug!("direct overlay failed ({saved}), retrying with snapping");
        let snap_op = SnapOverlay::new(&self.engine).with_precision(self.precision);
        match snap_op.result_geometry(g0, g1, op) {
            Ok(result) => Ok(result),
            // surface the original failure: it describes the true,
            // untransformed input coordinates
            Err(_) => Err(saved),
        }
    }
}
