//! Vector index abstraction and the persisted index bundle

pub mod bundle;
pub mod flat;

pub use bundle::{IndexBundle, SideTable};
pub use flat::FlatL2Index;

use crate::error::Result;

/// Ordinal used to pad results when fewer than `k` neighbours exist
pub const NO_NEIGHBOR: i64 = -1;

/// Raw k-nearest-neighbour result, in the index's native order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Neighbors {
    /// Distance per result (squared L2 for [`FlatL2Index`])
    pub distances: Vec<f32>,
    /// Index ordinal per result, or [`NO_NEIGHBOR`]
    pub ordinals: Vec<i64>,
}

impl Neighbors {
    /// `(distance, ordinal)` pairs, sentinels included
    pub fn pairs(&self) -> impl Iterator<Item = (f32, i64)> + '_ {
        self.distances.iter().copied().zip(self.ordinals.iter().copied())
    }
}

/// Read-only vector index consumed by the retriever
///
/// Implementations:
/// - `FlatL2Index`: exhaustive search over vectors loaded from the bundle
pub trait VectorIndex: Send + Sync {
    /// Total vectors stored
    fn len(&self) -> usize;

    /// Check if the index holds no vectors
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimensionality
    fn dimensions(&self) -> usize;

    /// Up to `k` nearest neighbours of `query`, padded with [`NO_NEIGHBOR`]
    fn search(&self, query: &[f32], k: usize) -> Result<Neighbors>;
}
