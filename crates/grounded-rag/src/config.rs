//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable holding the Cohere API key (embeddings + grounding)
pub const COHERE_API_KEY_ENV: &str = "COHERE_API_KEY";
/// Environment variable holding the key for the cosmetic rewrite provider
pub const STYLING_API_KEY_ENV: &str = "DEEPSEEK_API_KEY";
/// Environment variable pointing at a TOML config file
pub const CONFIG_PATH_ENV: &str = "GROUNDED_RAG_CONFIG";
/// Delay before the first provider retry; doubles per retry
pub const RETRY_BASE_DELAY_SECS: u64 = 1;
/// Upper bound on `http.max_retries` for any provider
pub const MAX_PROVIDER_RETRIES: u32 = 10;

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Persisted index bundle location
    pub index: IndexConfig,
    /// Retrieval settings
    pub retrieval: RetrievalConfig,
    /// Query embedding provider
    pub embeddings: EmbeddingConfig,
    /// Grounded answer generation
    pub grounding: GroundingConfig,
    /// Cosmetic rewrite of the grounded answer
    pub styling: StylingConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => match std::env::var_os(CONFIG_PATH_ENV) {
                Some(path) => Self::from_toml_file(Path::new(&path))?,
                None => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config file; missing sections take their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML config text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(COHERE_API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.embeddings.api_key = Some(key.clone());
                self.grounding.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var(STYLING_API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.styling.api_key = Some(key);
            }
        }
        if let Ok(dir) = std::env::var("GROUNDED_RAG_INDEX_DIR") {
            self.index.persist_dir = PathBuf::from(dir);
        }
        if let Ok(host) = std::env::var("GROUNDED_RAG_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("GROUNDED_RAG_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid GROUNDED_RAG_PORT '{}'", port),
            }
        }
    }

    /// Check settings that would make the service unusable
    pub fn validate(&self) -> Result<()> {
        if self.embeddings.api_key.is_none() {
            return Err(Error::Config(format!(
                "{} not found in environment variables",
                COHERE_API_KEY_ENV
            )));
        }
        if self.grounding.api_key.is_none() {
            return Err(Error::Config("grounding.api_key is not set".to_string()));
        }
        if !(0.0..=2.0).contains(&self.grounding.temperature) {
            return Err(Error::Config(format!(
                "grounding.temperature must be within 0.0-2.0, got {}",
                self.grounding.temperature
            )));
        }
        if self.retrieval.default_top_k == 0 || self.retrieval.max_top_k == 0 {
            return Err(Error::Config("retrieval top_k limits must be positive".to_string()));
        }
        if self.grounding.max_snippet_chars == 0 {
            return Err(Error::Config("grounding.max_snippet_chars must be positive".to_string()));
        }

        let mut providers = vec![
            ("embeddings", &self.embeddings.http),
            ("grounding", &self.grounding.http),
        ];
        if self.styling.enabled {
            providers.push(("styling", &self.styling.http));
        }

        for (section, http) in &providers {
            if http.timeout_secs == 0 {
                return Err(Error::Config(format!("{}.http.timeout_secs must be positive", section)));
            }
            if http.max_retries > MAX_PROVIDER_RETRIES {
                return Err(Error::Config(format!(
                    "{}.http.max_retries must be at most {}, got {}",
                    section, MAX_PROVIDER_RETRIES, http.max_retries
                )));
            }
        }

        // Providers must give up before the request deadline so fallbacks reach the caller
        let budget = providers
            .iter()
            .map(|(_, http)| http.worst_case_secs())
            .fold(0u64, u64::saturating_add);
        if budget > self.server.request_timeout_secs {
            return Err(Error::Config(format!(
                "provider timeouts and retries can take {}s, longer than server.request_timeout_secs ({}s)",
                budget, self.server.request_timeout_secs
            )));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Request-level timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_cors: true,
            request_timeout_secs: 120,
        }
    }
}

/// Location and file names of the persisted index bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory written by the ingestion run
    pub persist_dir: PathBuf,
    /// Vector index file (required)
    pub index_file: String,
    /// Side-table with mapping and document store (required)
    pub side_table_file: String,
    /// Separate metadata sequence (optional)
    pub metadata_file: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            persist_dir: PathBuf::from("docs/faiss"),
            index_file: "index.vec".to_string(),
            side_table_file: "index.json".to_string(),
            metadata_file: "metadata.json".to_string(),
        }
    }
}

impl IndexConfig {
    pub fn index_path(&self) -> PathBuf {
        self.persist_dir.join(&self.index_file)
    }

    pub fn side_table_path(&self) -> PathBuf {
        self.persist_dir.join(&self.side_table_file)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.persist_dir.join(&self.metadata_file)
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved per query when the request does not say
    pub default_top_k: usize,
    /// Upper bound on a per-request top_k
    pub max_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            max_top_k: 50,
        }
    }
}

/// Shared HTTP settings for provider clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderHttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for ProviderHttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_retries: 1,
        }
    }
}

impl ProviderHttpConfig {
    /// Longest one provider call can take: every attempt timing out plus backoff
    pub fn worst_case_secs(&self) -> u64 {
        let attempts = u64::from(self.max_retries).saturating_add(1);
        let backoff = (0..self.max_retries)
            .map(|retry| RETRY_BASE_DELAY_SECS.saturating_mul(1u64.checked_shl(retry).unwrap_or(u64::MAX)))
            .fold(0u64, u64::saturating_add);

        self.timeout_secs.saturating_mul(attempts).saturating_add(backoff)
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider base URL
    pub base_url: String,
    /// Embedding model
    pub model: String,
    /// Dimension used when probing the provider fails and no index is loaded
    pub default_dimensions: usize,
    /// API key (from COHERE_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Timeouts and retries
    pub http: ProviderHttpConfig,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cohere.com".to_string(),
            model: "embed-english-v3.0".to_string(),
            default_dimensions: 4096,
            api_key: None,
            http: ProviderHttpConfig::default(),
        }
    }
}

/// How the grounding provider should handle prompts over its context length
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromptTruncation {
    /// Provider drops the least relevant material automatically
    #[default]
    Auto,
    /// Reject over-long prompts
    Off,
}

/// Grounded generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingConfig {
    /// Provider base URL
    pub base_url: String,
    /// Chat model
    pub model: String,
    /// Temperature for generation (low = deterministic)
    pub temperature: f32,
    /// Prompt truncation mode for grounded requests
    pub prompt_truncation: PromptTruncation,
    /// Characters of chunk content sent per document
    pub max_snippet_chars: usize,
    /// System preamble for grounded answers
    pub preamble: String,
    /// System preamble when no documents were retrieved
    pub no_context_preamble: String,
    /// API key (from COHERE_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Timeouts and retries
    pub http: ProviderHttpConfig,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cohere.com".to_string(),
            model: "command-r-plus".to_string(),
            temperature: 0.3,
            prompt_truncation: PromptTruncation::Auto,
            max_snippet_chars: 3000,
            preamble: "You are an expert AI assistant. Answer the user's question based *only* on \
                the provided document snippets. Cite the source document number (e.g., [Document 1]) \
                when using information from it. If the answer isn't in the documents, state that clearly."
                .to_string(),
            no_context_preamble: "You are an AI assistant explaining limitations.".to_string(),
            api_key: None,
            http: ProviderHttpConfig::default(),
        }
    }
}

/// Cosmetic rewrite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylingConfig {
    /// Run the cosmetic stage at all
    pub enabled: bool,
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// Chat model
    pub model: String,
    /// System instruction for the rewrite
    pub system_instruction: String,
    /// Section delimiter; only the first delimited section is kept when present
    pub section_delimiter: String,
    /// API key (from DEEPSEEK_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Timeouts and retries
    pub http: ProviderHttpConfig,
}

impl Default for StylingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.deepseek.com/v1".to_string(),
            model: "deepseek-chat".to_string(),
            system_instruction: "Your job is to make text more appealing by adding emojis, formatting, \
                and other enhancements. Do not include any awkward markup though."
                .to_string(),
            section_delimiter: "\n---".to_string(),
            api_key: None,
            http: ProviderHttpConfig::default(),
        }
    }
}
