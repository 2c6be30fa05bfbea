//! OpenAI-compatible chat completions client for the cosmetic rewrite

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::StylingConfig;
use crate::error::{Error, Result};

use super::llm::StylingProvider;
use super::retry::{AttemptError, RetryPolicy};

/// Client for any `/chat/completions` endpoint (DeepSeek by default)
pub struct OpenAiCompatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiCompatClient {
    /// Create from styling configuration
    pub fn new(config: &StylingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("styling.api_key is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            retry: RetryPolicy::from_config(&config.http),
        })
    }
}

fn first_choice_text(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::llm("chat completion returned no content"))
}

#[async_trait]
impl StylingProvider for OpenAiCompatClient {
    async fn rewrite(&self, system_instruction: &str, user_text: &str) -> Result<String> {
        let url = &format!("{}/chat/completions", self.base_url);

        self.retry
            .run("Chat completion request", || async move {
                let request = ChatCompletionRequest {
                    model: &self.model,
                    messages: [
                        Message {
                            role: "system",
                            content: system_instruction,
                        },
                        Message {
                            role: "user",
                            content: user_text,
                        },
                    ],
                    stream: false,
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
                            Error::llm(format!("Chat completion request failed: {}", e)),
                        )
                    })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AttemptError::from_status(
                        status,
                        Error::llm(format!("Chat completion failed: HTTP {} - {}", status, body)),
                    ));
                }

                let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
                    Error::llm(format!("Failed to parse chat completion response: {}", e))
                })?;

                Ok(first_choice_text(completion)?)
            })
            .await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
