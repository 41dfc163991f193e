use geo::{Coordinate, GeoFloat};
use log::debug;
use rstar::{RTree, RTreeNum, RTreeObject, AABB};

use super::{monotone_chains_with_context, MonotoneChain};

/// Spatial index over the monotone chains of several coordinate
/// sequences.
///
/// Each added sequence is decomposed into chains carrying the
/// sequence's *source id* as their context; chain ids are global
/// across the index. [`for_each_overlap`](Self::for_each_overlap)
/// discovers every candidate intersecting segment pair between
/// distinct chains by an R-tree self-join, restricted to
/// `id_i < id_j` so each chain pair is compared exactly once.
/// Segments within one chain are never paired with each other: a
/// monotone run cannot properly self-intersect.
pub struct ChainIndex<'a, T: GeoFloat + RTreeNum> {
    chains: Vec<MonotoneChain<'a, T, usize>>,
    sequences: usize,
}

struct ChainRef<'c, 'a, T: GeoFloat + RTreeNum> {
    chain: &'c MonotoneChain<'a, T, usize>,
    tolerance: T,
}

impl<'c, 'a, T: GeoFloat + RTreeNum> RTreeObject for ChainRef<'c, 'a, T> {
    type Envelope = AABB<[T; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let env = self.chain.envelope_with_expansion(self.tolerance);
        AABB::from_corners([env.min().x, env.min().y], [env.max().x, env.max().y])
    }
}

impl<'a, T: GeoFloat + RTreeNum> ChainIndex<'a, T> {
    pub fn new() -> Self {
        ChainIndex {
            chains: Vec::new(),
            sequences: 0,
        }
    }

    /// Decompose `coords` into chains and add them to the index.
    /// Returns the source id attached to the new chains as context.
    pub fn add(&mut self, coords: &'a [Coordinate<T>]) -> usize {
        let source = self.sequences;
        self.sequences += 1;
        let base = self.chains.len();
        for (i, mut chain) in monotone_chains_with_context(coords, source)
            .into_iter()
            .enumerate()
        {
            chain.set_id(base + i);
            self.chains.push(chain);
        }
        debug!(
            "chain index: source {source} added {n} chains",
            n = self.chains.len() - base
        );
        source
    }

    /// All chains held by the index, in insertion order (position
    /// equals chain id).
    pub fn chains(&self) -> &[MonotoneChain<'a, T, usize>] {
        &self.chains
    }

    /// Invoke `action` with every candidate overlapping segment pair
    /// between distinct chains, with the envelope tests widened by
    /// `tolerance`. Pairs are reported with the lower chain id first;
    /// no pair is reported twice.
    pub fn for_each_overlap<F>(&self, tolerance: T, mut action: F)
    where
        F: FnMut(&MonotoneChain<'a, T, usize>, usize, &MonotoneChain<'a, T, usize>, usize),
    {
        let entries: Vec<_> = self
            .chains
            .iter()
            .map(|chain| ChainRef { chain, tolerance })
            .collect();
        let tree = RTree::bulk_load(entries);
        for (e0, e1) in tree.intersection_candidates_with_other_tree(&tree) {
            if e0.chain.id() >= e1.chain.id() {
                continue;
            }
            e0.chain
                .compute_overlaps_with_tolerance(e1.chain, tolerance, &mut action);
        }
    }
}

impl<'a, T: GeoFloat + RTreeNum> Default for ChainIndex<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}
