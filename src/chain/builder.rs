use geo::{Coordinate, GeoNum};
use log::trace;

use super::{MonotoneChain, Quadrant};

/// Partition `coords` into maximal monotone chains.
///
/// Every coordinate index of the slice is covered by exactly one
/// chain range (consecutive chains share their boundary coordinate),
/// and chains are numbered sequentially from zero in scan order. A
/// slice where all points are identical yields a single chain
/// spanning the whole slice. Runs in O(n).
///
/// Slices of fewer than 2 points cannot form a segment and are the
/// caller's error; they yield no chains.
pub fn monotone_chains<T: GeoNum>(coords: &[Coordinate<T>]) -> Vec<MonotoneChain<'_, T>> {
    monotone_chains_with_context(coords, ())
}

/// As [`monotone_chains`], attaching a copy of `context` to every
/// chain. The context is an opaque caller value, typically a
/// reference to whichever edge or sequence owns `coords`.
pub fn monotone_chains_with_context<T: GeoNum, D: Clone>(
    coords: &[Coordinate<T>],
    context: D,
) -> Vec<MonotoneChain<'_, T, D>> {
    debug_assert!(
        coords.len() >= 2,
        "monotone chains require at least 2 coordinates"
    );
    let mut chains = Vec::new();
    if coords.len() < 2 {
        return chains;
    }
    let mut start = 0;
    while start < coords.len() - 1 {
        let end = find_chain_end(coords, start);
        let id = chains.len();
        chains.push(MonotoneChain::new(coords, start, end, id, context.clone()));
        start = end;
    }
    trace!(
        "built {n} chains over {len} coordinates",
        n = chains.len(),
        len = coords.len()
    );
    chains
}

/// Index of the last coordinate of the maximal chain starting at
/// `start`.
fn find_chain_end<T: GeoNum>(coords: &[Coordinate<T>], start: usize) -> usize {
    // zero-length segments cannot establish the chain's quadrant;
    // skip over them here but include them in the chain below
    let mut safe_start = start;
    while safe_start < coords.len() - 1 && coords[safe_start] == coords[safe_start + 1] {
        safe_start += 1;
    }
    // the remainder is all repeated points: one chain to the end
    if safe_start >= coords.len() - 1 {
        return coords.len() - 1;
    }
    let chain_quad = Quadrant::of(coords[safe_start], coords[safe_start + 1]);
    let mut last = start + 1;
    while last < coords.len() {
        if coords[last - 1] != coords[last]
            && Quadrant::of(coords[last - 1], coords[last]) != chain_quad
        {
            break;
        }
        last += 1;
    }
    last - 1
}
