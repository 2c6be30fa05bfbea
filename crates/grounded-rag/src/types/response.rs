//! Result types produced per query

use serde::{Deserialize, Serialize};

use super::chunk::Metadata;

/// Transform an L2 distance into a bounded (0, 1] score, higher is better
///
/// Not a calibrated probability; only comparable within one embedding space.
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// One retrieved chunk with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Index ordinal of the chunk
    pub ordinal: usize,
    /// Chunk text
    pub content: String,
    /// Effective metadata for the chunk
    pub metadata: Metadata,
    /// `1 / (1 + distance)`
    pub similarity_score: f32,
}

/// A retrieved chunk as presented to the model and the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitedSource {
    /// 1-based index, matches `[Document N]` in the answer
    pub display_index: usize,
    /// The hit used as context
    pub hit: SearchHit,
}

/// Answer text plus the sources it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    /// Final answer text
    pub answer_text: String,
    /// Context in the order sent to the model
    pub cited_sources: Vec<CitedSource>,
}

impl QueryAnswer {
    /// Tag hits with their 1-based display index
    pub fn new(answer_text: String, hits: Vec<SearchHit>) -> Self {
        let cited_sources = hits
            .into_iter()
            .enumerate()
            .map(|(i, hit)| CitedSource {
                display_index: i + 1,
                hit,
            })
            .collect();

        Self {
            answer_text,
            cited_sources,
        }
    }
}
