//! Cohere client for query embeddings and grounded chat

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingConfig, GroundingConfig, PromptTruncation, ProviderHttpConfig};
use crate::error::{Error, Result};

use super::embedding::{EmbedMode, EmbeddingBackend};
use super::llm::{GroundedChatRequest, GroundingDocument, GroundingProvider};
use super::retry::{AttemptError, RetryPolicy};

/// Cohere REST API client with automatic retry
pub struct CohereClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
    model: &'a str,
    input_type: EmbedMode,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    model: &'a str,
    temperature: f32,
    preamble: &'a str,
    #[serde(skip_serializing_if = "no_documents")]
    documents: &'a [GroundingDocument],
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_truncation: Option<PromptTruncation>,
}

fn no_documents(documents: &&[GroundingDocument]) -> bool {
    documents.is_empty()
}

#[derive(Deserialize)]
struct ChatResponse {
    text: String,
}

impl CohereClient {
    /// Create a new client
    pub fn new(base_url: &str, api_key: &str, http: &ProviderHttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry: RetryPolicy::from_config(http),
        })
    }

    /// Check if the API key is accepted
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1/models", self.base_url);

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Embed texts with retry
    pub async fn embed(&self, model: &str, texts: &[String], mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
        let url = &format!("{}/v1/embed", self.base_url);

        self.retry
            .run("Cohere embed request", || async move {
                let request = EmbedRequest {
                    texts,
                    model,
                    input_type: mode,
                };

                let response = self
                    .client
                    .post(url)
                    .bearer_auth(&self.api_key)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| {
                        AttemptError::from_send(
                            &e,
                            Error::embedding(format!("Embedding request failed: {}", e)),
                        )
                    })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AttemptError::from_status(
                        status,
                        Error::embedding(format!("Embedding failed: HTTP {} - {}", status, body)),
                    ));
                }

                let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                    Error::embedding(format!("Failed to parse embedding response: {}", e))
                })?;

                if embed_response.embeddings.len() != texts.len() {
                    return Err(Error::embedding(format!(
                        "Expected {} embeddings, got {}",
                        texts.len(),
                        embed_response.embeddings.len()
                    ))
                    .into());
                }

                Ok(embed_response.embeddings)
            })
            .await
    }

    /// Run a chat request with retry
    pub async fn chat(&self, model: &str, request: &GroundedChatRequest) -> Result<String> {
        let url = &format!("{}/v1/chat", self.base_url);

        tracing::info!(
            "Generating answer with model: {} ({} documents)",
            model,
            request.documents.len()
        );

        self.retry
            .run("Cohere chat request", || async move {
                let body = ChatRequest {
                    message: &request.message,
                    model,
                    temperature: request.temperature,
                    preamble: &request.preamble,
                    documents: &request.documents,
                    prompt_truncation: request.prompt_truncation,
                };

                let response = self
                    .client
                    .post(url)
                    .bearer_auth(&self.api_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| {
                        AttemptError::from_send(&e, Error::llm(format!("Chat request failed: {}", e)))
                    })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AttemptError::from_status(
                        status,
                        Error::llm(format!("Chat failed: HTTP {} - {}", status, body)),
                    ));
                }

                let chat_response: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::llm(format!("Failed to parse chat response: {}", e)))?;

                Ok(chat_response.text)
            })
            .await
    }
}

/// Cohere embedding provider
pub struct CohereEmbedder {
    client: Arc<CohereClient>,
    model: String,
}

impl CohereEmbedder {
    /// Create from embedding configuration
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("embeddings.api_key is not set".to_string()))?;

        Ok(Self {
            client: Arc::new(CohereClient::new(&config.base_url, api_key, &config.http)?),
            model: config.model.clone(),
        })
    }

    /// Create from existing client
    pub fn from_client(client: Arc<CohereClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl EmbeddingBackend for CohereEmbedder {
    async fn embed(&self, texts: &[String], mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
        self.client.embed(&self.model, texts, mode).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "cohere"
    }
}

/// Cohere grounded chat provider
pub struct CohereChat {
    client: Arc<CohereClient>,
    model: String,
}

impl CohereChat {
    /// Create from grounding configuration
    pub fn new(config: &GroundingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("grounding.api_key is not set".to_string()))?;

        Ok(Self {
            client: Arc::new(CohereClient::new(&config.base_url, api_key, &config.http)?),
            model: config.model.clone(),
        })
    }

    /// Create from existing client
    pub fn from_client(client: Arc<CohereClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl GroundingProvider for CohereChat {
    async fn chat(&self, request: &GroundedChatRequest) -> Result<String> {
        self.client.chat(&self.model, request).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "cohere"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
