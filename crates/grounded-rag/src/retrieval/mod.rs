//! Query-time retrieval over the loaded index and corpus

pub mod search;

pub use search::Retriever;
