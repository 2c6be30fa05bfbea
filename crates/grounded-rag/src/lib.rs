//! grounded-rag: question answering over a persisted vector index
//!
//! Loads a pre-built index bundle (vectors, ordinal mapping, document store and
//! optional metadata), retrieves the chunks nearest to a question, and asks a
//! language model to answer only from those chunks with `[Document N]` citations.

pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod service;
pub mod store;
pub mod types;

pub use config::RagConfig;
pub use error::{ApiError, Error, Result};
pub use service::{Providers, QueryService};
pub use types::{
    chunk::{Chunk, Metadata},
    query::{QueryRequest, QueryResponse},
    response::{QueryAnswer, SearchHit},
};
