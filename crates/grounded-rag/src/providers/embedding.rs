//! Embedding provider boundary and the degrading query embedder

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Which side of retrieval a text is embedded for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbedMode {
    /// A user question
    #[serde(rename = "search_query")]
    Query,
    /// A corpus chunk
    #[serde(rename = "search_document")]
    Document,
}

/// Trait for generating text embeddings
///
/// Implementations:
/// - `CohereEmbedder`: Cohere embed API (embed-english-v3.0)
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a batch of texts, one vector per text
    async fn embed(&self, texts: &[String], mode: EmbedMode) -> Result<Vec<Vec<f32>>>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Embeds queries with a fixed dimensionality
///
/// `embed_query` never fails: on any provider failure it returns the
/// all-zero vector, which callers treat as "embedding unavailable".
#[derive(Clone)]
pub struct QueryEmbedder {
    backend: Arc<dyn EmbeddingBackend>,
    dimensions: usize,
}

impl QueryEmbedder {
    /// Use a known dimensionality
    pub fn new(backend: Arc<dyn EmbeddingBackend>, dimensions: usize) -> Self {
        Self {
            backend,
            dimensions,
        }
    }

    /// Determine the dimensionality by embedding a probe text
    pub async fn probe(backend: Arc<dyn EmbeddingBackend>, fallback_dimensions: usize) -> Self {
        let probe = vec!["test".to_string()];
        let dimensions = match backend.embed(&probe, EmbedMode::Query).await {
            Ok(vectors) if vectors.first().is_some_and(|v| !v.is_empty()) => vectors[0].len(),
            Ok(_) => {
                tracing::warn!(
                    "Embedding probe returned no vector, defaulting to dimension {}",
                    fallback_dimensions
                );
                fallback_dimensions
            }
            Err(e) => {
                tracing::warn!(
                    "Could not determine embedding dimension automatically: {}. Defaulting to {}.",
                    e,
                    fallback_dimensions
                );
                fallback_dimensions
            }
        };

        tracing::info!("Query embedder ready ({}, dimension {})", backend.name(), dimensions);
        Self::new(backend, dimensions)
    }

    /// Vector length produced by this embedder
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed a query, surfacing provider failures
    pub async fn try_embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.backend.embed(&[text.to_string()], EmbedMode::Query).await?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("no query embedding found in the response"))?;

        if vector.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "query embedding has dimension {}, expected {}",
                vector.len(),
                self.dimensions
            )));
        }

        Ok(vector)
    }

    /// Embed a query, degrading to the zero vector on failure
    pub async fn embed_query(&self, text: &str) -> Vec<f32> {
        match self.try_embed_query(text).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!("Query embedding error: {}. Returning zero vector.", e);
                vec![0.0; self.dimensions]
            }
        }
    }
}

/// Whether a vector is the degraded all-zero embedding
pub fn is_zero_vector(vector: &[f32]) -> bool {
    vector.iter().all(|v| *v == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedBackend(Option<Vec<f32>>);

    #[async_trait]
    impl EmbeddingBackend for FixedBackend {
        async fn embed(&self, texts: &[String], _mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
            match &self.0 {
                Some(v) => Ok(texts.iter().map(|_| v.clone()).collect()),
                None => Err(Error::embedding("connection refused")),
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.0.is_some())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_probe_uses_provider_dimension() {
        let embedder = QueryEmbedder::probe(Arc::new(FixedBackend(Some(vec![0.5; 3]))), 4096).await;
        assert_eq!(embedder.dimensions(), 3);
        assert_eq!(embedder.embed_query("hello").await, vec![0.5; 3]);
    }

    #[tokio::test]
    async fn test_probe_failure_uses_fallback() {
        let embedder = QueryEmbedder::probe(Arc::new(FixedBackend(None)), 4096).await;
        assert_eq!(embedder.dimensions(), 4096);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_zero_vector() {
        let embedder = QueryEmbedder::new(Arc::new(FixedBackend(None)), 4);
        assert!(embedder.try_embed_query("q").await.is_err());

        let vector = embedder.embed_query("q").await;
        assert_eq!(vector.len(), 4);
        assert!(is_zero_vector(&vector));
    }

    #[tokio::test]
    async fn test_wrong_dimension_degrades() {
        let embedder = QueryEmbedder::new(Arc::new(FixedBackend(Some(vec![1.0; 2]))), 4);
        assert_eq!(embedder.embed_query("q").await, vec![0.0; 4]);
    }

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(serde_json::to_value(EmbedMode::Query).unwrap(), "search_query");
        assert_eq!(serde_json::to_value(EmbedMode::Document).unwrap(), "search_document");
    }
}
