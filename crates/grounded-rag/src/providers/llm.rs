//! Language-model boundaries: grounded chat and cosmetic rewrite

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::PromptTruncation;
use crate::error::Result;

/// A context document sent with a grounded chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingDocument {
    pub title: String,
    pub snippet: String,
}

/// Everything the grounding provider needs for one answer
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedChatRequest {
    /// User message (the query, or the no-context notice)
    pub message: String,
    /// Context documents, in display order
    pub documents: Vec<GroundingDocument>,
    /// Sampling temperature
    pub temperature: f32,
    /// Over-length handling; provider default when `None`
    pub prompt_truncation: Option<PromptTruncation>,
    /// System preamble
    pub preamble: String,
}

/// Trait for grounded answer generation
///
/// Implementations:
/// - `CohereChat`: Cohere chat API with native document grounding
#[async_trait]
pub trait GroundingProvider: Send + Sync {
    /// Generate an answer, returning the raw text
    async fn chat(&self, request: &GroundedChatRequest) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}

/// Trait for the cosmetic rewrite of a finished answer
///
/// Implementations:
/// - `OpenAiCompatClient`: any OpenAI-compatible chat completions endpoint
#[async_trait]
pub trait StylingProvider: Send + Sync {
    /// Rewrite `user_text` under `system_instruction`
    async fn rewrite(&self, system_instruction: &str, user_text: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
