//! Grounded answering with degraded fallbacks

use std::sync::Arc;

use crate::config::{GroundingConfig, StylingConfig};
use crate::providers::{GroundedChatRequest, GroundingProvider, StylingProvider};
use crate::types::{QueryAnswer, SearchHit};

use super::prompt::PromptBuilder;
use super::style::{extract_styled_section, strip_emphasis};

/// Returned when nothing was retrieved and the model could not be reached
pub const NO_CONTEXT_FALLBACK: &str =
    "I could not find relevant documents and encountered an error trying to respond.";

/// Returned when the grounded generation call fails
pub const GROUNDED_FALLBACK: &str =
    "Sorry, I encountered an error while trying to generate a response using the retrieved documents.";

/// Turns retrieved hits into an answer; never fails
pub struct GroundedAnswerer {
    grounding: Arc<dyn GroundingProvider>,
    styling: Option<Arc<dyn StylingProvider>>,
    grounding_config: GroundingConfig,
    styling_config: StylingConfig,
}

impl GroundedAnswerer {
    /// Create an answerer; `styling` is `None` when the cosmetic stage is unavailable
    pub fn new(
        grounding: Arc<dyn GroundingProvider>,
        styling: Option<Arc<dyn StylingProvider>>,
        grounding_config: GroundingConfig,
        styling_config: StylingConfig,
    ) -> Self {
        Self {
            grounding,
            styling,
            grounding_config,
            styling_config,
        }
    }

    /// Answer `query` from `context`, tagging each hit with its display index
    pub async fn answer(&self, query: &str, context: Vec<SearchHit>) -> QueryAnswer {
        let text = self.generate_response(query, &context).await;
        QueryAnswer::new(text, context)
    }

    /// Answer text for `query`, or a fixed fallback on provider failure
    pub async fn generate_response(&self, query: &str, context: &[SearchHit]) -> String {
        if context.is_empty() {
            return self.respond_without_context(query).await;
        }

        let request = GroundedChatRequest {
            message: query.to_string(),
            documents: PromptBuilder::build_documents(context, self.grounding_config.max_snippet_chars),
            temperature: self.grounding_config.temperature,
            prompt_truncation: Some(self.grounding_config.prompt_truncation),
            preamble: self.grounding_config.preamble.clone(),
        };

        tracing::info!(
            "Generating grounded response with {} ({} documents)",
            self.grounding.model(),
            request.documents.len()
        );

        match self.grounding.chat(&request).await {
            Ok(raw) => self.stylize(raw).await,
            Err(e) => {
                tracing::error!("Grounded generation failed: {}", e);
                GROUNDED_FALLBACK.to_string()
            }
        }
    }

    async fn respond_without_context(&self, query: &str) -> String {
        tracing::warn!("No context documents provided, generating a no-context response");

        let request = GroundedChatRequest {
            message: PromptBuilder::no_context_message(query),
            documents: Vec::new(),
            temperature: self.grounding_config.temperature,
            prompt_truncation: None,
            preamble: self.grounding_config.no_context_preamble.clone(),
        };

        match self.grounding.chat(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("No-context response failed: {}", e);
                NO_CONTEXT_FALLBACK.to_string()
            }
        }
    }

    /// Best-effort cosmetic rewrite; the grounded answer survives any failure
    async fn stylize(&self, raw: String) -> String {
        let Some(styling) = self.styling.as_ref().filter(|_| self.styling_config.enabled) else {
            return raw;
        };

        match styling
            .rewrite(&self.styling_config.system_instruction, &raw)
            .await
        {
            Ok(output) => {
                let section = extract_styled_section(&output, &self.styling_config.section_delimiter);
                let cleaned = strip_emphasis(section);
                if cleaned.trim().is_empty() {
                    tracing::warn!("Styling returned no usable text, keeping the grounded answer");
                    raw
                } else {
                    cleaned
                }
            }
            Err(e) => {
                tracing::warn!("Styling failed ({}), keeping the grounded answer", e);
                raw
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PromptTruncation;
    use crate::error::{Error, Result};
    use crate::types::Metadata;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records requests and replies with a fixed answer, or fails
    struct RecordingChat {
        reply: Option<String>,
        requests: Mutex<Vec<GroundedChatRequest>>,
    }

    impl RecordingChat {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> GroundedChatRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl GroundingProvider for RecordingChat {
        async fn chat(&self, request: &GroundedChatRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().ok_or_else(|| Error::llm("connection refused"))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.reply.is_some())
        }

        fn name(&self) -> &str {
            "recording"
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    struct FixedStyle(Option<String>);

    #[async_trait]
    impl StylingProvider for FixedStyle {
        async fn rewrite(&self, _system_instruction: &str, _user_text: &str) -> Result<String> {
            self.0.clone().ok_or_else(|| Error::llm("styling unavailable"))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "style-model"
        }
    }

    fn hits() -> Vec<SearchHit> {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), json!("guide.pdf"));
        metadata.insert("type".to_string(), json!("pdf"));
        vec![SearchHit {
            ordinal: 4,
            content: "Compost needs nitrogen and carbon.".to_string(),
            metadata,
            similarity_score: 0.8,
        }]
    }

    fn answerer(
        chat: Arc<RecordingChat>,
        style: Option<FixedStyle>,
    ) -> GroundedAnswerer {
        GroundedAnswerer::new(
            chat,
            style.map(|s| Arc::new(s) as Arc<dyn StylingProvider>),
            GroundingConfig::default(),
            StylingConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_grounded_request_shape() {
        let chat = RecordingChat::replying("Use greens and browns [Document 1].");
        let answerer = answerer(chat.clone(), None);

        let text = answerer.generate_response("How do I compost?", &hits()).await;
        assert_eq!(text, "Use greens and browns [Document 1].");

        let request = chat.last_request();
        assert_eq!(request.message, "How do I compost?");
        assert_eq!(request.documents.len(), 1);
        assert_eq!(request.documents[0].title, "Document 1 (Source: guide.pdf)");
        assert_eq!(request.prompt_truncation, Some(PromptTruncation::Auto));
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
        assert!(request.preamble.contains("[Document 1]"));
    }

    #[tokio::test]
    async fn test_no_context_uses_limitation_prompt() {
        let chat = RecordingChat::replying("Sorry, nothing on that topic.");
        let answerer = answerer(chat.clone(), Some(FixedStyle(Some("styled".to_string()))));

        let text = answerer.generate_response("unknown topic", &[]).await;
        assert_eq!(text, "Sorry, nothing on that topic.");

        let request = chat.last_request();
        assert!(request.documents.is_empty());
        assert!(request.message.contains("'unknown topic'"));
        assert_eq!(request.preamble, GroundingConfig::default().no_context_preamble);
    }

    #[tokio::test]
    async fn test_no_context_provider_failure_returns_fallback() {
        let answerer = answerer(RecordingChat::failing(), None);
        assert_eq!(answerer.generate_response("q", &[]).await, NO_CONTEXT_FALLBACK);
    }

    #[tokio::test]
    async fn test_grounded_provider_failure_returns_fallback() {
        let answerer = answerer(RecordingChat::failing(), Some(FixedStyle(Some("styled".to_string()))));
        assert_eq!(answerer.generate_response("q", &hits()).await, GROUNDED_FALLBACK);
    }

    #[tokio::test]
    async fn test_styling_output_is_cleaned() {
        let answerer = answerer(
            RecordingChat::replying("raw answer"),
            Some(FixedStyle(Some("🌿 **Greens** and *browns* [Document 1]".to_string()))),
        );

        assert_eq!(
            answerer.generate_response("q", &hits()).await,
            "🌿 Greens and browns [Document 1]"
        );
    }

    #[tokio::test]
    async fn test_styling_delimited_section() {
        let answerer = answerer(
            RecordingChat::replying("raw answer"),
            Some(FixedStyle(Some("Sure!\n---\n✨ Styled body\n---\nHope this helps".to_string()))),
        );

        assert_eq!(answerer.generate_response("q", &hits()).await, "\n✨ Styled body");
    }

    #[tokio::test]
    async fn test_styling_failure_keeps_grounded_answer() {
        let answerer = answerer(
            RecordingChat::replying("grounded answer [Document 1]"),
            Some(FixedStyle(None)),
        );

        assert_eq!(
            answerer.generate_response("q", &hits()).await,
            "grounded answer [Document 1]"
        );
    }

    #[tokio::test]
    async fn test_empty_styling_keeps_grounded_answer() {
        let answerer = answerer(
            RecordingChat::replying("grounded answer"),
            Some(FixedStyle(Some("**".to_string()))),
        );

        assert_eq!(answerer.generate_response("q", &hits()).await, "grounded answer");
    }

    #[tokio::test]
    async fn test_answer_tags_sources() {
        let answerer = answerer(RecordingChat::replying("ok"), None);
        let answer = answerer.answer("q", hits()).await;

        assert_eq!(answer.answer_text, "ok");
        assert_eq!(answer.cited_sources.len(), 1);
        assert_eq!(answer.cited_sources[0].display_index, 1);
        assert_eq!(answer.cited_sources[0].hit.ordinal, 4);
    }
}
