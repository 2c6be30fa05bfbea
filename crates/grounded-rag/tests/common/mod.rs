//! Shared fixtures: in-process providers and bundles on disk

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};

use grounded_rag::config::RagConfig;
use grounded_rag::index::{FlatL2Index, IndexBundle, SideTable};
use grounded_rag::providers::{
    EmbedMode, EmbeddingBackend, GroundedChatRequest, GroundingProvider, StylingProvider,
};
use grounded_rag::service::Providers;
use grounded_rag::types::{Metadata, StoredDocument};
use grounded_rag::{Error, Result};

/// Embeds every text to the same vector, or fails every call
pub struct FixedEmbedder(pub Option<Vec<f32>>);

#[async_trait]
impl EmbeddingBackend for FixedEmbedder {
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

/// Records grounded requests and answers with a canned reply
pub struct ScriptedChat {
    pub reply: Option<String>,
    pub requests: Mutex<Vec<GroundedChatRequest>>,
}

impl ScriptedChat {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<GroundedChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GroundingProvider for ScriptedChat {
    async fn chat(&self, request: &GroundedChatRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone().ok_or_else(|| Error::llm("connection refused"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.reply.is_some())
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Grounding provider that answers only after a long delay
pub struct SlowChat(pub std::time::Duration);

#[async_trait]
impl GroundingProvider for SlowChat {
    async fn chat(&self, _request: &GroundedChatRequest) -> Result<String> {
        tokio::time::sleep(self.0).await;
        Ok("Too late.".to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "slow"
    }

    fn model(&self) -> &str {
        "slow-model"
    }
}

/// Cosmetic stage that always fails
pub struct BrokenStyling;

#[async_trait]
impl StylingProvider for BrokenStyling {
    async fn rewrite(&self, _system_instruction: &str, _user_text: &str) -> Result<String> {
        Err(Error::llm("styling provider returned HTTP 502"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "broken"
    }

    fn model(&self) -> &str {
        "broken-model"
    }
}

pub fn providers(
    embedder: FixedEmbedder,
    chat: Arc<ScriptedChat>,
    styling: Option<Arc<dyn StylingProvider>>,
) -> Providers {
    Providers {
        embeddings: Arc::new(embedder),
        grounding: chat,
        styling,
    }
}

pub fn config_for(dir: &Path) -> RagConfig {
    let mut config = RagConfig::default();
    config.index.persist_dir = dir.to_path_buf();
    config
}

/// Write a bundle of `n` chunks; chunk `i` sits at `(i, 0)`
///
/// `unmapped` ordinals are left out of the mapping.
pub fn write_bundle(dir: &Path, n: usize, unmapped: &[usize]) -> IndexBundle {
    let bundle = IndexBundle::in_dir(dir);
    let vectors: Vec<Vec<f32>> = (0..n).map(|i| vec![i as f32, 0.0]).collect();
    let index = FlatL2Index::from_vectors(2, &vectors).unwrap();

    let mut table = SideTable::default();
    for i in 0..n {
        let id = format!("chunk-{}", i);
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), json!(format!("docs/guide-{}.pdf", i)));
        metadata.insert("type".to_string(), json!("pdf"));
        metadata.insert("page".to_string(), json!(i + 1));
        table.docstore.insert(
            id.clone(),
            StoredDocument {
                content: format!("Guide section {} about composting.", i),
                metadata,
            },
        );
        if !unmapped.contains(&i) {
            table.index_to_docstore_id.insert(i, id);
        }
    }

    bundle.write(&index, &table, None).unwrap();
    bundle
}
