//! Command implementations

pub mod ask;
pub mod cards;
pub mod chunk;
pub mod index;
pub mod profile;
pub mod query;
pub mod search;
pub mod status;
pub mod tag;

use crate::app::{OutputFormat, PlacesArgs};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vibenav_core::{Config, Embedder, HttpEmbedder, LLMClient, OpenAICompatClient, VibeError};

/// Failure already reported on stdout; only the exit code remains
#[derive(Debug)]
pub struct CommandFailed {
    pub code: i32,
}

impl std::fmt::Display for CommandFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "command failed with exit code {}", self.code)
    }
}

impl std::error::Error for CommandFailed {}

/// Shared state for a CLI invocation
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
    client: Arc<OpenAICompatClient>,
}

impl Context {
    pub fn new(config_path: Option<&Path>, format: OutputFormat) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        let client = Arc::new(OpenAICompatClient::new(config.llm_service.clone())?);
        Ok(Self {
            config,
            format,
            client,
        })
    }

    pub fn llm(&self) -> Arc<dyn LLMClient> {
        self.client.clone()
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::new(HttpEmbedder::new(self.client.clone()))
    }

    pub fn index_dir(&self, overridden: Option<&PathBuf>) -> PathBuf {
        overridden
            .cloned()
            .unwrap_or_else(|| self.config.index_dir.clone())
    }

    /// `--places`, or the tagged file for `--category`/`--city`
    pub fn places_file(&self, args: &PlacesArgs) -> Result<PathBuf, VibeError> {
        if let Some(path) = &args.places {
            return Ok(path.clone());
        }
        match (&args.category, &args.city) {
            (Some(category), Some(city)) => Ok(self.config.tagged_places_file(category, city)),
            _ => Err(VibeError::InvalidInput(
                "pass --places <file> or both --category and --city".to_string(),
            )),
        }
    }

    pub fn log_metrics(&self) {
        let metrics = self.client.metrics();
        if metrics.total_requests > 0 {
            tracing::debug!(
                "Provider requests: {} ({} errors), cache hit rate {:.1}%, avg latency {:.0}ms",
                metrics.total_requests,
                metrics.total_errors,
                metrics.cache_hit_rate,
                metrics.avg_latency_ms
            );
            let cache = self.client.cache_stats();
            tracing::debug!(
                "Embedding cache: {} active, {} expired",
                cache.active_entries,
                cache.expired_entries
            );
        }
    }
}

/// Print `{"error": ...}` on stdout and fail with the error's exit code
pub fn print_json_error(error: &VibeError) -> anyhow::Error {
    let body = serde_json::json!({ "error": error.to_string() });
    println!(
        "{}",
        serde_json::to_string_pretty(&body).unwrap_or_else(|_| "{}".to_string())
    );
    CommandFailed {
        code: error.exit_code(),
    }
    .into()
}

/// Join positional words into one string, rejecting empty input
pub fn join_words(words: &[String], what: &str) -> Result<String, VibeError> {
    let text = words.join(" ").trim().to_string();
    if text.is_empty() {
        return Err(VibeError::InvalidInput(format!("{} is empty", what)));
    }
    Ok(text)
}
