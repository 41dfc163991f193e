use geo::Coordinate;

use rand::Rng;

/// A random walk with unit-bounded steps. Step directions change
/// freely, so monotone runs stay short and the chain structure is
/// non-trivial.
pub fn random_walk<R: Rng>(rng: &mut R, len: usize) -> Vec<Coordinate<f64>> {
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
