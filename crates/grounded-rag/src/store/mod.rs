//! Document store: corpus reconstruction from a persisted index bundle

pub mod corpus;

pub use corpus::{Corpus, Lookup, MetadataSource, ReconstructionReport};

use crate::error::Result;
use crate::index::{FlatL2Index, IndexBundle, VectorIndex};

/// Vector index plus the corpus reconstructed against it
pub struct LoadedIndex {
    pub index: FlatL2Index,
    pub corpus: Corpus,
}

/// Load and reconcile a bundle
///
/// Missing or unreadable required files are fatal. Every other
/// inconsistency is logged and skipped.
pub fn load_bundle(bundle: &IndexBundle) -> Result<LoadedIndex> {
    tracing::info!("Loading vector index from: {}", bundle.index_path.display());
    tracing::info!("Loading docstore info from: {}", bundle.side_table_path.display());
    tracing::info!("Loading separate metadata from: {}", bundle.metadata_path.display());

    bundle.check_required()?;

    let index = bundle.load_index()?;
    tracing::info!(
        "Vector index loaded with {} vectors (dimension {})",
        index.len(),
        index.dimensions()
    );

    let side_table = bundle.load_side_table()?;
    tracing::info!(
        "Side-table loaded: {} mapping entries, {} documents",
        side_table.index_to_docstore_id.len(),
        side_table.docstore.len()
    );

    let metadata = match bundle.load_metadata() {
        Ok(Some(metadata)) => {
            tracing::info!("Loaded separate metadata list with {} entries", metadata.len());
            Some(metadata)
        }
        Ok(None) => {
            tracing::warn!(
                "Separate metadata file ({}) not found, using metadata attached to documents",
                bundle.metadata_path.display()
            );
            None
        }
        Err(e) => {
            tracing::warn!(
                "Ignoring unreadable metadata file {}: {}",
                bundle.metadata_path.display(),
                e
            );
            None
        }
    };

    let corpus = Corpus::reconstruct(index.len(), &side_table, metadata);

    Ok(LoadedIndex { index, corpus })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::index::SideTable;
    use crate::types::{Metadata, StoredDocument};
    use serde_json::json;

    fn write_bundle(dir: &std::path::Path, n: usize, metadata: Option<&[Metadata]>) -> IndexBundle {
        let bundle = IndexBundle::in_dir(dir);
        let vectors: Vec<Vec<f32>> = (0..n).map(|i| vec![i as f32, 0.0]).collect();
        let index = FlatL2Index::from_vectors(2, &vectors).unwrap();

        let mut table = SideTable::default();
        for i in 0..n {
            let id = format!("id-{}", i);
            let mut meta = Metadata::new();
            meta.insert("source".to_string(), json!(format!("doc{}.pdf", i)));
            table.docstore.insert(
                id.clone(),
                StoredDocument {
                    content: format!("content {}", i),
                    metadata: meta,
                },
            );
            table.index_to_docstore_id.insert(i, id);
        }

        bundle.write(&index, &table, metadata).unwrap();
        bundle
    }

    #[test]
    fn test_load_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = write_bundle(dir.path(), 3, None);

        let loaded = load_bundle(&bundle).unwrap();
        assert_eq!(loaded.index.len(), 3);
        assert_eq!(loaded.corpus.len(), 3);
        assert_eq!(loaded.corpus.report().metadata_source, MetadataSource::Embedded);
    }

    #[test]
    fn test_missing_side_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = write_bundle(dir.path(), 2, None);
        std::fs::remove_file(&bundle.side_table_path).unwrap();

        let err = load_bundle(&bundle).err().unwrap();
        assert!(matches!(err, Error::MissingIndexFile(_)));
    }

    #[test]
    fn test_missing_index_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = write_bundle(dir.path(), 2, None);
        std::fs::remove_file(&bundle.index_path).unwrap();

        assert!(load_bundle(&bundle).err().unwrap().is_fatal_load());
    }

    #[test]
    fn test_malformed_metadata_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = write_bundle(dir.path(), 2, None);
        std::fs::write(&bundle.metadata_path, "{not json").unwrap();

        let loaded = load_bundle(&bundle).unwrap();
        assert_eq!(loaded.corpus.report().metadata_source, MetadataSource::Embedded);
        assert_eq!(loaded.corpus.len(), 2);
    }

    #[test]
    fn test_separate_metadata_used_when_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let separate: Vec<Metadata> = (0..2)
            .map(|i| {
                let mut m = Metadata::new();
                m.insert("source".to_string(), json!(format!("https://site/{}", i)));
                m
            })
            .collect();
        let bundle = write_bundle(dir.path(), 2, Some(&separate));

        let loaded = load_bundle(&bundle).unwrap();
        assert_eq!(loaded.corpus.report().metadata_source, MetadataSource::Separate);
    }
}
