use geo::{Coordinate, GeoNum};

/// Direction quadrant of a segment vector.
///
/// Segments whose vectors fall in the same quadrant are jointly
/// monotone in both `x` and `y`; this is what lets a chain of them
/// derive its envelope from its two end points alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    NorthEast,
    NorthWest,
    SouthWest,
    SouthEast,
}

impl Quadrant {
    /// Quadrant of the vector `(dx, dy)`, or `None` for the zero vector.
    ///
    /// Vectors along the axes are assigned to the adjacent
    /// counter-clockwise quadrant: `(1, 0)` is north-east, `(0, -1)`
    /// is south-east.
    pub fn from_offset<T: GeoNum>(dx: T, dy: T) -> Option<Self> {
        let zero = T::zero();
        if dx == zero && dy == zero {
            return None;
        }
        Some(if dx >= zero {
            if dy >= zero {
                Quadrant::NorthEast
            } else {
                Quadrant::SouthEast
            }
        } else if dy >= zero {
            Quadrant::NorthWest
        } else {
            Quadrant::SouthWest
        })
    }

    /// Quadrant of the segment from `p0` to `p1`, or `None` for a
    /// zero-length segment.
    pub fn of<T: GeoNum>(p0: Coordinate<T>, p1: Coordinate<T>) -> Option<Self> {
        Self::from_offset(p1.x - p0.x, p1.y - p0.y)
    }
}
