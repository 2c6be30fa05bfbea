//! Top-k retrieval with normalized similarity scores

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::index::{VectorIndex, NO_NEIGHBOR};
use crate::providers::{is_zero_vector, QueryEmbedder};
use crate::store::{Corpus, Lookup};
use crate::types::{similarity_from_distance, SearchHit};

/// Embeds a query, searches the index and resolves hits against the corpus
///
/// Holds only shared read-only state, so one instance serves concurrent
/// queries without locking.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    corpus: Arc<Corpus>,
    embedder: QueryEmbedder,
}

impl Retriever {
    /// Create a retriever over a loaded index and its corpus
    pub fn new(index: Arc<dyn VectorIndex>, corpus: Arc<Corpus>, embedder: QueryEmbedder) -> Self {
        Self {
            index,
            corpus,
            embedder,
        }
    }

    /// Corpus the hits are resolved against
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Vector index searched by this retriever
    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }

    /// Up to `k` hits for `query`, ordered by similarity descending
    ///
    /// Embedding failures degrade to a zero-vector search. Index errors
    /// (dimension mismatch, worker panic) are returned.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        if self.index.is_empty() || self.corpus.is_empty() {
            tracing::warn!(
                "Search skipped: index has {} vectors, corpus has {} chunks",
                self.index.len(),
                self.corpus.len()
            );
            return Ok(Vec::new());
        }

        let k = k.min(self.corpus.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed_query(query).await;
        if is_zero_vector(&vector) {
            tracing::warn!("Searching with a zero query vector; results will be arbitrary");
        }

        let index = Arc::clone(&self.index);
        let neighbors = tokio::task::spawn_blocking(move || index.search(&vector, k))
            .await
            .map_err(|e| Error::internal(format!("Vector search task failed: {}", e)))??;

        let mut hits = Vec::with_capacity(k);
        for (distance, ordinal) in neighbors.pairs() {
            if ordinal == NO_NEIGHBOR {
                continue;
            }

            let Ok(position) = usize::try_from(ordinal) else {
                tracing::warn!("Ignoring invalid ordinal {} returned by the index", ordinal);
                continue;
            };

            match self.corpus.lookup(position) {
                Lookup::Found(chunk, metadata) => hits.push(SearchHit {
                    ordinal: chunk.ordinal,
                    content: chunk.content.clone(),
                    metadata: metadata.clone(),
                    similarity_score: similarity_from_distance(distance),
                }),
                Lookup::OutOfBounds => {
                    tracing::warn!(
                        "Index returned ordinal {} outside the corpus (size {}), skipping",
                        position,
                        self.corpus.len()
                    );
                }
                Lookup::Gap => {
                    tracing::warn!(
                        "Index returned ordinal {} that has no reconstructed chunk, skipping",
                        position
                    );
                }
            }
        }

        // Stable, so equal scores keep the index's order
        hits.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));

        tracing::debug!("Retrieved {} hits for k={}", hits.len(), k);
        Ok(hits)
    }
}
