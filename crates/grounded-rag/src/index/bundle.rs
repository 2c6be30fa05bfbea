//! Files of a persisted index bundle
//!
//! A bundle directory holds:
//! - the vector index (`index.vec`, required)
//! - the side-table with the ordinal mapping and document store (`index.json`, required)
//! - a metadata sequence parallel to the corpus (`metadata.json`, optional)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::types::{Metadata, StoredDocument};

use super::flat::FlatL2Index;

/// Ordinal mapping plus keyed document store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideTable {
    /// `external_id -> document`
    pub docstore: HashMap<String, StoredDocument>,
    /// `ordinal -> external_id`; entries may be missing
    pub index_to_docstore_id: BTreeMap<usize, String>,
}

impl SideTable {
    /// Look up the external ID recorded for an ordinal
    pub fn external_id(&self, ordinal: usize) -> Option<&str> {
        self.index_to_docstore_id
            .get(&ordinal)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Look up a document by external ID
    pub fn document(&self, external_id: &str) -> Option<&StoredDocument> {
        self.docstore.get(external_id)
    }
}

/// Paths of one bundle on disk
#[derive(Debug, Clone)]
pub struct IndexBundle {
    pub index_path: PathBuf,
    pub side_table_path: PathBuf,
    pub metadata_path: PathBuf,
}

impl IndexBundle {
    /// Bundle in `dir` with the default file names
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::from_config(&IndexConfig {
            persist_dir: dir.as_ref().to_path_buf(),
            ..IndexConfig::default()
        })
    }

    /// Bundle described by the index configuration
    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            index_path: config.index_path(),
            side_table_path: config.side_table_path(),
            metadata_path: config.metadata_path(),
        }
    }

    /// Fail unless both required files exist
    pub fn check_required(&self) -> Result<()> {
        for path in [&self.index_path, &self.side_table_path] {
            if !path.exists() {
                return Err(Error::MissingIndexFile(path.clone()));
            }
        }
        Ok(())
    }

    /// Load the vector index
    pub fn load_index(&self) -> Result<FlatL2Index> {
        FlatL2Index::load(&self.index_path)
    }

    /// Load the side-table; a structural mismatch is fatal
    pub fn load_side_table(&self) -> Result<SideTable> {
        let content = std::fs::read_to_string(&self.side_table_path)
            .map_err(|e| Error::index_load(&self.side_table_path, e.to_string()))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::index_load(&self.side_table_path, e.to_string()))
    }

    /// Load the optional metadata sequence
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn load_metadata(&self) -> Result<Option<Vec<Metadata>>> {
        if !self.metadata_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.metadata_path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Persist a bundle, creating the directory when needed
    pub fn write(
        &self,
        index: &FlatL2Index,
        side_table: &SideTable,
        metadata: Option<&[Metadata]>,
    ) -> Result<()> {
        if let Some(parent) = self.index_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        index.save(&self.index_path)?;
        std::fs::write(&self.side_table_path, serde_json::to_string_pretty(side_table)?)?;

        match metadata {
            Some(metadata) => {
                std::fs::write(&self.metadata_path, serde_json::to_string_pretty(metadata)?)?;
            }
            None if self.metadata_path.exists() => std::fs::remove_file(&self.metadata_path)?,
            None => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::VectorIndex;
    use serde_json::json;

    #[test]
    fn test_side_table_json_shape() {
        let table: SideTable = serde_json::from_value(json!({
            "docstore": {
                "a1": {"content": "first", "metadata": {"source": "a.pdf"}},
                "b2": {"content": "second"}
            },
            "index_to_docstore_id": {"0": "a1", "1": "b2"}
        }))
        .unwrap();

        assert_eq!(table.external_id(0), Some("a1"));
        assert_eq!(table.external_id(2), None);
        assert_eq!(table.document("b2").map(|d| d.content.as_str()), Some("second"));
    }

    #[test]
    fn test_non_integer_ordinal_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = IndexBundle::in_dir(dir.path());
        std::fs::write(
            &bundle.side_table_path,
            r#"{"docstore": {}, "index_to_docstore_id": {"zero": "a1"}}"#,
        )
        .unwrap();

        let err = bundle.load_side_table().unwrap_err();
        assert!(err.is_fatal_load());
    }

    #[test]
    fn test_check_required() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = IndexBundle::in_dir(dir.path());
        assert!(matches!(bundle.check_required(), Err(Error::MissingIndexFile(_))));

        bundle
            .write(&FlatL2Index::new(4), &SideTable::default(), None)
            .unwrap();
        assert!(bundle.check_required().is_ok());
        assert_eq!(bundle.load_metadata().unwrap(), None);
        assert_eq!(bundle.load_index().unwrap().dimensions(), 4);
    }
}
