//! In-memory corpus rebuilt in vector-index order

use serde::Serialize;
use std::collections::HashMap;

use crate::index::SideTable;
use crate::types::{Chunk, Metadata};

/// Where the effective per-chunk metadata came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    /// The separately persisted metadata sequence, by position
    Separate,
    /// Metadata embedded in each stored document
    Embedded,
}

/// Counts emitted by one reconstruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconstructionReport {
    /// Vectors in the index
    pub index_size: usize,
    /// Entries in the ordinal mapping
    pub mapping_size: usize,
    /// Chunks reconstructed
    pub loaded: usize,
    /// Ordinals with no mapping entry
    pub missing_in_mapping: usize,
    /// Mapped IDs absent from the document store
    pub missing_in_docstore: usize,
    /// Metadata source in effect
    pub metadata_source: MetadataSource,
    /// Length of a separate metadata sequence that was discarded
    pub discarded_metadata: Option<usize>,
}

impl ReconstructionReport {
    /// Whether index, mapping and corpus fully agree
    pub fn is_consistent(&self) -> bool {
        self.index_size == self.mapping_size
            && self.loaded == self.index_size
            && self.discarded_metadata.is_none()
    }
}

/// Outcome of resolving an index ordinal against the corpus
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// The chunk and its effective metadata
    Found(&'a Chunk, &'a Metadata),
    /// Ordinal past the end of the index the corpus was built against
    OutOfBounds,
    /// Ordinal skipped during reconstruction
    Gap,
}

/// Reconstructed chunks, parallel metadata and ordinal lookups
///
/// Immutable after construction; shared read-only between queries.
#[derive(Debug, Clone)]
pub struct Corpus {
    chunks: Vec<Chunk>,
    metadata: Vec<Metadata>,
    /// `ordinal -> position in chunks`, one slot per indexed vector
    positions: Vec<Option<usize>>,
    by_external_id: HashMap<String, usize>,
    report: ReconstructionReport,
}

impl Corpus {
    /// Rebuild the corpus for an index of `index_size` vectors
    ///
    /// Ordinals missing from the mapping, and mapped IDs missing from the
    /// document store, are logged and skipped.
    pub fn reconstruct(
        index_size: usize,
        side_table: &SideTable,
        separate_metadata: Option<Vec<Metadata>>,
    ) -> Self {
        let mapping_size = side_table.index_to_docstore_id.len();
        if mapping_size != index_size {
            tracing::warn!(
                "Vector index size ({}) does not match mapping size ({}). Reconstruction might be incomplete.",
                index_size,
                mapping_size
            );
        }

        let mut chunks = Vec::with_capacity(index_size);
        let mut positions = vec![None; index_size];
        let mut missing_in_mapping = 0;
        let mut missing_in_docstore = 0;

        for (ordinal, slot) in positions.iter_mut().enumerate() {
            let Some(external_id) = side_table.external_id(ordinal) else {
                tracing::warn!("No docstore ID found in mapping for index ordinal {}", ordinal);
                missing_in_mapping += 1;
                continue;
            };

            let Some(doc) = side_table.document(external_id) else {
                tracing::warn!(
                    "Document with ID '{}' (index ordinal {}) not found in the docstore",
                    external_id,
                    ordinal
                );
                missing_in_docstore += 1;
                continue;
            };

            *slot = Some(chunks.len());
            chunks.push(Chunk::from_stored(ordinal, external_id, doc.clone()));
        }

        let (metadata, metadata_source, discarded_metadata) = match separate_metadata {
            Some(separate) if !chunks.is_empty() && separate.len() == chunks.len() => {
                (separate, MetadataSource::Separate, None)
            }
            Some(separate) => {
                if chunks.is_empty() {
                    tracing::warn!("Loaded metadata but no documents were reconstructed. Discarding metadata.");
                } else {
                    tracing::warn!(
                        "Mismatch between reconstructed documents ({}) and loaded metadata list ({}). \
                         Falling back to metadata attached to documents.",
                        chunks.len(),
                        separate.len()
                    );
                }
                let embedded = chunks.iter().map(|c| c.metadata.clone()).collect();
                (embedded, MetadataSource::Embedded, Some(separate.len()))
            }
            None => {
                let embedded = chunks.iter().map(|c| c.metadata.clone()).collect();
                (embedded, MetadataSource::Embedded, None)
            }
        };

        let by_external_id = chunks
            .iter()
            .enumerate()
            .map(|(position, chunk)| (chunk.external_id.clone(), position))
            .collect();

        let report = ReconstructionReport {
            index_size,
            mapping_size,
            loaded: chunks.len(),
            missing_in_mapping,
            missing_in_docstore,
            metadata_source,
            discarded_metadata,
        };

        tracing::info!(
            "Reconstructed {} documents ({} missing in mapping, {} missing in docstore, metadata: {:?})",
            report.loaded,
            report.missing_in_mapping,
            report.missing_in_docstore,
            report.metadata_source
        );

        Self {
            chunks,
            metadata,
            positions,
            by_external_id,
            report,
        }
    }

    /// Number of reconstructed chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if nothing was reconstructed
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunks in ordinal order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Counts from reconstruction
    pub fn report(&self) -> &ReconstructionReport {
        &self.report
    }

    /// Resolve an index ordinal
    pub fn lookup(&self, ordinal: usize) -> Lookup<'_> {
        match self.positions.get(ordinal) {
            None => Lookup::OutOfBounds,
            Some(None) => Lookup::Gap,
            Some(Some(position)) => Lookup::Found(&self.chunks[*position], &self.metadata[*position]),
        }
    }

    /// Chunk and effective metadata by external ID
    pub fn get_by_external_id(&self, external_id: &str) -> Option<(&Chunk, &Metadata)> {
        self.by_external_id
            .get(external_id)
            .map(|&position| (&self.chunks[position], &self.metadata[position]))
    }
}
