use geo::coords_iter::CoordsIter;
use geo::map_coords::{MapCoords, MapCoordsInplace};
use geo::{Coordinate, Geometry};
use log::debug;

/// Accumulates the high-order bit pattern shared by a set of doubles.
///
/// Two doubles that agree in sign, exponent and their leading
/// mantissa bits lose exactly those leading bits when subtracted;
/// stripping the common value beforehand leaves the full mantissa
/// available to downstream subtraction-heavy predicates.
#[derive(Debug, Clone)]
pub struct CommonBits {
    is_first: bool,
    common_mantissa_bits_count: u32,
    common_bits: u64,
    common_sign_exp: u64,
}

impl CommonBits {
    pub fn new() -> Self {
        CommonBits {
            is_first: true,
            common_mantissa_bits_count: 53,
            common_bits: 0,
            common_sign_exp: 0,
        }
    }

    pub fn add(&mut self, num: f64) {
        let num_bits = num.to_bits();
        if self.is_first {
            self.common_bits = num_bits;
            self.common_sign_exp = sign_exp_bits(num_bits);
            self.is_first = false;
            return;
        }
        if sign_exp_bits(num_bits) != self.common_sign_exp {
            // differing sign or exponent: no usable common value
            self.common_bits = 0;
            return;
        }
        self.common_mantissa_bits_count = common_mantissa_bits(self.common_bits, num_bits);
        self.common_bits = zero_lower_bits(
            self.common_bits,
            64 - (12 + self.common_mantissa_bits_count),
        );
    }

    /// The common high-order value of everything added so far.
    pub fn common(&self) -> f64 {
        f64::from_bits(self.common_bits)
    }
}

impl Default for CommonBits {
    fn default() -> Self {
        Self::new()
    }
}

fn sign_exp_bits(bits: u64) -> u64 {
    bits >> 52
}

/// Number of leading mantissa bits (counting the lowest exponent bit
/// at position 52 downwards) on which the two patterns agree.
fn common_mantissa_bits(bits0: u64, bits1: u64) -> u32 {
    let mut count = 0;
    for i in (0..=52).rev() {
        if get_bit(bits0, i) != get_bit(bits1, i) {
            return count;
        }
        count += 1;
    }
    52
}

fn zero_lower_bits(bits: u64, n_bits: u32) -> u64 {
    let inv_mask = (1u64 << n_bits) - 1;
    bits & !inv_mask
}

fn get_bit(bits: u64, i: u32) -> u64 {
    (bits >> i) & 1
}

/// Computes the common bits of the coordinates of a set of
/// geometries, and produces translated copies with the common part
/// removed or restored.
///
/// Removal and restore are exact: the common value shares the sign
/// and exponent of each coordinate, so the subtraction loses no bits
/// and adding the value back reproduces the originals.
///
/// Inputs are never mutated; both transforms return owned
/// geometries.
#[derive(Debug, Clone)]
pub struct CommonBitsRemover {
    common_bits_x: CommonBits,
    common_bits_y: CommonBits,
}

impl CommonBitsRemover {
    pub fn new() -> Self {
        CommonBitsRemover {
            common_bits_x: CommonBits::new(),
            common_bits_y: CommonBits::new(),
        }
    }

    /// Accumulate the coordinates of `g` into the common-bits
    /// computation.
    pub fn add(&mut self, g: &Geometry<f64>) {
        for c in g.coords_iter() {
            self.common_bits_x.add(c.x);
            self.common_bits_y.add(c.y);
        }
    }

    /// The common value of all coordinates added so far.
    pub fn common_coordinate(&self) -> Coordinate<f64> {
        Coordinate {
            x: self.common_bits_x.common(),
            y: self.common_bits_y.common(),
        }
    }

    /// A copy of `g` with the common value subtracted from every
    /// coordinate.
    pub fn remove_common_bits(&self, g: &Geometry<f64>) -> Geometry<f64> {
        let common = self.common_coordinate();
        if common.x == 0. && common.y == 0. {
            return g.clone();
        }
        debug!("removing common bits {common:?}");
        g.map_coords(|&(x, y)| (x - common.x, y - common.y))
    }

    /// Restore the common value into `g`'s coordinates in place.
    pub fn add_common_bits(&self, g: &mut Geometry<f64>) {
        let common = self.common_coordinate();
        if common.x == 0. && common.y == 0. {
            return;
        }
        g.map_coords_inplace(|&(x, y)| (x + common.x, y + common.y));
    }
}

impl Default for CommonBitsRemover {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, LineString, Rect};

    use super::*;

    #[test]
    fn single_value_is_its_own_common_part() {
        let mut bits = CommonBits::new();
        bits.add(123.456);
        assert_eq!(bits.common(), 123.456);
    }

    #[test]
    fn shared_prefix_is_extracted() {
        let mut bits = CommonBits::new();
        bits.add(1_234_567.1234);
        bits.add(1_234_567.5678);
        // the values agree down to their integer part and diverge in
        // the first fraction bit
        assert_eq!(bits.common(), 1_234_567.0);
    }

    #[test]
    fn differing_exponents_have_no_common_part() {
        let mut bits = CommonBits::new();
        bits.add(1.0);
        bits.add(1.0e9);
        assert_eq!(bits.common(), 0.);
    }

    #[test]
    fn differing_signs_have_no_common_part() {
        let mut bits = CommonBits::new();
        bits.add(1.5);
        bits.add(-1.5);
        assert_eq!(bits.common(), 0.);
    }

    fn far_square(offset: f64) -> Geometry<f64> {
        Rect::new((offset, offset), (offset + 1., offset + 1.))
            .to_polygon()
            .into()
    }

    #[test]
    fn removal_shrinks_far_coordinates() {
        let g0 = far_square(1.0e8);
        let g1 = far_square(1.0e8 + 0.5);
        let mut cbr = CommonBitsRemover::new();
        cbr.add(&g0);
        cbr.add(&g1);
        let common = cbr.common_coordinate();
        assert!(common.x > 0. && common.y > 0.);

        let removed = cbr.remove_common_bits(&g0);
        for c in removed.coords_iter() {
            assert!(c.x.abs() < 1.0e8);
            assert!(c.y.abs() < 1.0e8);
        }
    }

    #[test]
    fn removal_and_restore_round_trips_bit_exactly() {
        let g0 = far_square(1.0e8);
        let g1 = far_square(1.0e8 + 0.5);
        let mut cbr = CommonBitsRemover::new();
        cbr.add(&g0);
        cbr.add(&g1);

        let mut translated = cbr.remove_common_bits(&g0);
        cbr.add_common_bits(&mut translated);

        let original: Vec<_> = g0.coords_iter().collect();
        let restored: Vec<_> = translated.coords_iter().collect();
        assert_eq!(original.len(), restored.len());
        for (o, r) in original.iter().zip(&restored) {
            assert_eq!(o.x.to_bits(), r.x.to_bits());
            assert_eq!(o.y.to_bits(), r.y.to_bits());
        }
    }

    #[test]
    fn no_common_part_leaves_geometry_unchanged() {
        // coordinates spanning the origin share no sign bit
        let g: Geometry<f64> =
            Geometry::LineString(LineString(vec![(-1., -1.).into(), (1., 1.).into()]));
        let mut cbr = CommonBitsRemover::new();
        cbr.add(&g);
        assert_eq!(cbr.common_coordinate(), Coordinate { x: 0., y: 0. });
        let removed = cbr.remove_common_bits(&g);
        assert_eq!(
            removed.coords_iter().collect::<Vec<_>>(),
            g.coords_iter().collect::<Vec<_>>()
        );
    }
}
