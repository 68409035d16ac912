//! Configuration management

use crate::error::{Result, VibeError};
use crate::llm::RetryPolicy;
use crate::search::PlaceSelection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Review chunking parameters
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Retrieval parameters used by the query router
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Retry policies per call site
    #[serde(default)]
    pub retry: RetryConfig,

    /// Directory holding the persisted vector index
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    /// Directory holding combined place files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_service: LLMServiceConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            retry: RetryConfig::default(),
            index_dir: default_index_dir(),
            data_dir: default_data_dir(),
        }
    }
}

/// Default vector index directory
pub const DEFAULT_INDEX_DIR: &str = "vibe_vectorstore";

fn default_index_dir() -> PathBuf {
    PathBuf::from(DEFAULT_INDEX_DIR)
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("Combined Output")
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the OpenAI-compatible chat completions service
    pub url: String,

    /// Model name for chat completions (tagging, answers, profiles)
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions (detected from the first response if not specified)
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature for chat completions
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token limit
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("VIBENAV_LLM_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("VIBENAV_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("VIBENAV_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("VIBENAV_LLM_API_KEY").ok(),
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("VIBENAV_LLM_MODEL").unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("VIBENAV_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "sentence-transformers/all-MiniLM-L6-v2".to_string())
}

fn default_timeout() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

/// Chunking parameters, measured in characters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    crate::index::CHUNK_SIZE_CHARS
}

fn default_chunk_overlap() -> usize {
    crate::index::CHUNK_OVERLAP_CHARS
}

/// Retrieval parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks fetched per routed query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidate pool for MMR search
    #[serde(default = "default_fetch_k")]
    pub fetch_k: usize,

    /// MMR trade-off: 1.0 is pure relevance, 0.0 pure diversity
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f32,

    /// How the router picks a place when several match
    #[serde(default)]
    pub selection: PlaceSelection,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            fetch_k: default_fetch_k(),
            mmr_lambda: default_mmr_lambda(),
            selection: PlaceSelection::default(),
        }
    }
}

fn default_top_k() -> usize {
    15
}

fn default_fetch_k() -> usize {
    25
}

fn default_mmr_lambda() -> f32 {
    0.5
}

/// Retry settings for one call site
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

/// Retry policies, parameterised per call site
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Structured answer generation
    #[serde(default = "default_answer_retry")]
    pub answer: RetrySettings,

    /// Tag classification (single attempt unless configured)
    #[serde(default = "default_tagging_retry")]
    pub tagging: RetrySettings,

    /// Free-form questions about a named place
    #[serde(default = "default_answer_retry")]
    pub qa: RetrySettings,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            answer: default_answer_retry(),
            tagging: default_tagging_retry(),
            qa: default_answer_retry(),
        }
    }
}

fn default_answer_retry() -> RetrySettings {
    RetrySettings {
        max_attempts: 3,
        base_delay_ms: 1000,
    }
}

fn default_tagging_retry() -> RetrySettings {
    RetrySettings {
        max_attempts: 1,
        base_delay_ms: 1000,
    }
}

impl Config {
    /// Load config from `VIBENAV_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("VIBENAV_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from an explicit path; a missing file yields defaults
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        } else {
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(VibeError::Config("chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(VibeError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if !(0.0..=1.0).contains(&self.retrieval.mmr_lambda) {
            return Err(VibeError::Config(
                "mmr_lambda must be within 0.0..=1.0".to_string(),
            ));
        }
        let retries = [self.retry.answer, self.retry.tagging, self.retry.qa];
        if retries.iter().any(|r| r.max_attempts == 0) {
            return Err(VibeError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the combined place file for a (category, city) key
    pub fn places_file(&self, category: &str, city: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}_combined.json", category, city))
    }

    /// Path of the tagged place file for a (category, city) key
    pub fn tagged_places_file(&self, category: &str, city: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}_combined_tagged.json", category, city))
    }
}
