//! Indexed chunk types with metadata used for citations

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder for absent `source` / `type` metadata
pub const UNKNOWN: &str = "Unknown";

/// Per-chunk metadata as written by ingestion (`source`, `type`, optional `page`, ...)
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Typed accessors over chunk metadata with the display defaults applied
pub trait MetadataExt {
    /// Origin of the chunk (file path, URL, ...), `"Unknown"` when absent
    fn source(&self) -> String;
    /// Loader kind (`web`, `pdf`, `audio`, ...), `"Unknown"` when absent
    fn doc_type(&self) -> String;
    /// Page number for paginated sources
    fn page(&self) -> Option<String>;
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl MetadataExt for Metadata {
    fn source(&self) -> String {
        self.get("source")
            .filter(|v| !v.is_null())
            .map(display_value)
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn doc_type(&self) -> String {
        self.get("type")
            .filter(|v| !v.is_null())
            .map(display_value)
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn page(&self) -> Option<String> {
        self.get("page").filter(|v| !v.is_null()).map(display_value)
    }
}

/// A document as stored in the backing key-value document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Chunk text
    pub content: String,
    /// Metadata embedded with the document
    #[serde(default)]
    pub metadata: Metadata,
}

/// A unit of indexed text, reconstructed in vector-index order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk's vector in the index
    pub ordinal: usize,
    /// Stable identifier in the document store
    pub external_id: String,
    /// Chunk text
    pub content: String,
    /// Metadata embedded with the document
    pub metadata: Metadata,
}

impl Chunk {
    /// Build a chunk from its stored document
    pub fn from_stored(ordinal: usize, external_id: impl Into<String>, doc: StoredDocument) -> Self {
        Self {
            ordinal,
            external_id: external_id.into(),
            content: doc.content,
            metadata: doc.metadata,
        }
    }
}
