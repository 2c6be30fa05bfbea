//! Query service: load once, answer many

use serde::Serialize;
use std::sync::Arc;

use crate::config::{RagConfig, RetrievalConfig};
use crate::error::{Error, Result};
use crate::generation::GroundedAnswerer;
use crate::index::{IndexBundle, VectorIndex};
use crate::providers::{
    CohereChat, CohereEmbedder, EmbeddingBackend, GroundingProvider, OpenAiCompatClient,
    QueryEmbedder, StylingProvider,
};
use crate::retrieval::Retriever;
use crate::store::{load_bundle, ReconstructionReport};
use crate::types::QueryAnswer;

/// External collaborators, constructed once at startup
#[derive(Clone)]
pub struct Providers {
    pub embeddings: Arc<dyn EmbeddingBackend>,
    pub grounding: Arc<dyn GroundingProvider>,
    /// Cosmetic rewrite; skipped when `None`
    pub styling: Option<Arc<dyn StylingProvider>>,
}

impl Providers {
    /// Build the HTTP clients named in the configuration
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let embeddings: Arc<dyn EmbeddingBackend> = Arc::new(CohereEmbedder::new(&config.embeddings)?);
        let grounding: Arc<dyn GroundingProvider> = Arc::new(CohereChat::new(&config.grounding)?);

        let styling: Option<Arc<dyn StylingProvider>> = if !config.styling.enabled {
            None
        } else if config.styling.api_key.is_none() {
            tracing::warn!("Styling API key not set, answers will not be styled");
            None
        } else {
            Some(Arc::new(OpenAiCompatClient::new(&config.styling)?))
        };

        Ok(Self {
            embeddings,
            grounding,
            styling,
        })
    }
}

/// Sizes and reconstruction counts of the loaded core
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub index_vectors: usize,
    pub dimensions: usize,
    pub corpus_chunks: usize,
    pub reconstruction: ReconstructionReport,
}

/// Retriever and answerer over one loaded index bundle
pub struct QueryService {
    retriever: Retriever,
    answerer: GroundedAnswerer,
    retrieval: RetrievalConfig,
}

impl QueryService {
    /// Load the index bundle and wire the pipeline
    ///
    /// Fails only on missing or unreadable required bundle files.
    pub async fn load(config: &RagConfig, providers: Providers) -> Result<Self> {
        let bundle = IndexBundle::from_config(&config.index);
        let loaded = tokio::task::spawn_blocking(move || load_bundle(&bundle))
            .await
            .map_err(|e| Error::internal(format!("Index load task failed: {}", e)))??;

        let index_dimensions = loaded.index.dimensions();
        let fallback_dimensions = if index_dimensions > 0 {
            index_dimensions
        } else {
            config.embeddings.default_dimensions
        };

        let probed = QueryEmbedder::probe(providers.embeddings.clone(), fallback_dimensions).await;
        let embedder = if index_dimensions == 0 || probed.dimensions() == index_dimensions {
            probed
        } else {
            tracing::error!(
                "Embedding dimension {} does not match index dimension {}; queries will search with a zero vector",
                probed.dimensions(),
                index_dimensions
            );
            QueryEmbedder::new(providers.embeddings, index_dimensions)
        };

        let retriever = Retriever::new(Arc::new(loaded.index), Arc::new(loaded.corpus), embedder);
        let answerer = GroundedAnswerer::new(
            providers.grounding,
            providers.styling,
            config.grounding.clone(),
            config.styling.clone(),
        );

        tracing::info!("RAG core initialized ({} chunks)", retriever.corpus().len());

        Ok(Self {
            retriever,
            answerer,
            retrieval: config.retrieval.clone(),
        })
    }

    /// Requested `top_k`, defaulted and capped by configuration
    pub fn resolve_top_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.retrieval.default_top_k)
            .min(self.retrieval.max_top_k)
    }

    /// Retrieve context for `query` and answer from it
    pub async fn ask(&self, query: &str, k: usize) -> Result<QueryAnswer> {
        tracing::info!("Processing query: '{}'", query);

        let hits = self.retriever.search(query, k).await?;
        tracing::info!("Retrieved {} documents", hits.len());

        Ok(self.answerer.answer(query, hits).await)
    }

    /// The retriever, for callers that only need search
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn stats(&self) -> ServiceStats {
        let index = self.retriever.index();
        let corpus = self.retriever.corpus();

        ServiceStats {
            index_vectors: index.len(),
            dimensions: index.dimensions(),
            corpus_chunks: corpus.len(),
            reconstruction: corpus.report().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_providers_require_cohere_key() {
        let config = RagConfig::default();
        assert!(Providers::from_config(&config).is_err());
    }

    #[test]
    fn test_styling_skipped_without_key() {
        let mut config = RagConfig::default();
        config.embeddings.api_key = Some("cohere".to_string());
        config.grounding.api_key = Some("cohere".to_string());

        let providers = Providers::from_config(&config).unwrap();
        assert!(providers.styling.is_none());
        assert_eq!(providers.grounding.model(), "command-r-plus");

        config.styling.api_key = Some("deepseek".to_string());
        let providers = Providers::from_config(&config).unwrap();
        assert_eq!(providers.styling.unwrap().model(), "deepseek-chat");

        config.styling.enabled = false;
        assert!(Providers::from_config(&config).unwrap().styling.is_none());
    }
}
