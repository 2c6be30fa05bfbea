//! Provider abstractions for embeddings and language models
//!
//! Collaborators are constructed once at startup and injected into the
//! retriever and answerer; tests substitute in-process implementations.

pub mod cohere;
pub mod embedding;
pub mod llm;
pub mod openai;
pub mod retry;

pub use cohere::{CohereChat, CohereClient, CohereEmbedder};
pub use embedding::{is_zero_vector, EmbedMode, EmbeddingBackend, QueryEmbedder};
pub use llm::{GroundedChatRequest, GroundingDocument, GroundingProvider, StylingProvider};
pub use openai::OpenAiCompatClient;
pub use retry::RetryPolicy;
