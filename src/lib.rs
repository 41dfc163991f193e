//! Robustness layer for boolean overlay operations on 2-d geometries.
//!
//! 1. [Monotone Chains](#monotone-chains)
//! 1. [Snapping](#snapping)
//! 1. [Snap-Retry Overlay](#snap-retry-overlay)
//!
//! # Monotone Chains
//!
//! A [`MonotoneChain`] is a run of consecutive segments whose
//! direction vectors all fall in the same quadrant, so the envelope
//! of any sub-run follows from its two end points alone. This makes
//! envelope queries and pairwise overlap searches prune cheaply while
//! guaranteeing no false negatives, the property an intersection
//! index must have. Build chains with [`monotone_chains`], or index
//! whole geometries with a [`ChainIndex`].
//!
//! ```rust
//! use geo::Coordinate;
//! use geo_robust::monotone_chains;
//!
//! let pts: Vec<Coordinate<f64>> = vec![
//!     (0., 0.).into(),
//!     (1., 1.).into(),
//!     (2., 3.).into(),
//!     (3., 2.).into(),
//! ];
//! // two north-east segments, then a south-east one
//! let chains = monotone_chains(&pts);
//! assert_eq!(chains.len(), 2);
//! ```
//!
//! # Snapping
//!
//! [`GeometrySnapper`] pulls near-coincident vertices and segments of
//! one geometry onto another geometry's vertices, removing the
//! ill-conditioned configurations that break exact-arithmetic overlay
//! computations.
//!
//! ```rust
//! use geo::{Geometry, LineString};
//! use geo_robust::GeometrySnapper;
//!
//! let a: Geometry<f64> = LineString(vec![(0., 0.).into(), (10., 10.).into()]).into();
//! let b: Geometry<f64> = LineString(vec![(0., 1e-5).into(), (10., 10.).into()]).into();
//! let (snapped_a, _snapped_b) = GeometrySnapper::snap(&a, &b, 1e-3);
//! match snapped_a {
//!     Geometry::LineString(ls) => assert_eq!(ls.0[0].y, 1e-5),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! # Snap-Retry Overlay
//!
//! [`SnapIfNeededOverlay`] wraps any overlay algorithm (an
//! [`OverlayEngine`], e.g. a closure) with a two-stage retry: the
//! engine runs on the unmodified inputs first, and only on a
//! robustness failure are the inputs conditioned (common mantissa
//! bits removed, then snapped together) and the engine run once
//! more. A double failure surfaces the original error.
//!
//! ```rust
//! use geo::{Geometry, Rect};
//! use geo_robust::{OpType, OverlayError, SnapIfNeededOverlay};
//!
//! let engine = |g0: &Geometry<f64>, _g1: &Geometry<f64>, _op: OpType|
//!     -> Result<Geometry<f64>, OverlayError> { Ok(g0.clone()) };
//! let overlay = SnapIfNeededOverlay::new(engine);
//!
//! let square: Geometry<f64> = Rect::new((0., 0.), (1., 1.)).to_polygon().into();
//! assert!(overlay.intersection(&square, &square).is_ok());
//! ```

pub mod chain;
pub use chain::{
    monotone_chains, monotone_chains_with_context, ChainIndex, MonotoneChain, Quadrant,
};

pub mod snap;
pub use snap::{extract_target_coordinates, GeometrySnapper, LineStringSnapper};

pub mod precision;
pub use precision::{CommonBits, CommonBitsRemover, PrecisionModel};

pub mod overlay;
pub use overlay::{
    OpType, OverlayEngine, OverlayError, ResultValidator, SnapIfNeededOverlay, SnapOverlay,
};
