//! Wire types of the query endpoint

use serde::{Deserialize, Serialize};

use super::chunk::Metadata;
use super::response::QueryAnswer;

/// Body of `POST /api/query`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    #[serde(default)]
    pub query: Option<String>,
    /// Number of chunks to retrieve (server default when absent)
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            top_k: None,
        }
    }

    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// The query text, if present and non-empty
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.trim().is_empty())
    }
}

/// Source entry returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// 1-based display index
    pub id: usize,
    /// Similarity score rounded to 4 decimals
    pub score: f64,
    /// Full chunk metadata
    pub metadata: Metadata,
}

/// Body returned by `POST /api/query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Answer text
    pub response: String,
    /// Sources used as context
    pub sources: Vec<SourceInfo>,
}

fn round4(score: f32) -> f64 {
    (f64::from(score) * 10_000.0).round() / 10_000.0
}

impl From<QueryAnswer> for QueryResponse {
    fn from(answer: QueryAnswer) -> Self {
        let sources = answer
            .cited_sources
            .into_iter()
            .map(|source| SourceInfo {
                id: source.display_index,
                score: round4(source.hit.similarity_score),
                metadata: source.hit.metadata,
            })
            .collect();

        Self {
            response: answer.answer_text,
            sources,
        }
    }
}
