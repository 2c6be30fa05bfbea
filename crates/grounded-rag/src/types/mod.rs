//! Core types for the RAG system

pub mod chunk;
pub mod query;
pub mod response;

pub use chunk::{Chunk, Metadata, MetadataExt, StoredDocument};
pub use query::{QueryRequest, QueryResponse, SourceInfo};
pub use response::{similarity_from_distance, CitedSource, QueryAnswer, SearchHit};
