//! HTTP client for OpenAI-compatible LLM services (Groq, Gemini, vLLM, etc.)

use super::cache::{CacheStats, EmbeddingCache};
use super::{ChatMessage, LLMClient};
use crate::config::LLMServiceConfig;
use crate::error::{Result, VibeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cache size at which expired embeddings are evicted
const CACHE_CLEANUP_THRESHOLD: usize = 4096;

/// API metrics for monitoring
#[derive(Debug, Default)]
pub struct APIMetrics {
    pub total_requests: AtomicU64,
    pub total_errors: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub total_latency_ms: AtomicU64,
}

/// Snapshot of API metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub avg_latency_ms: f64,
}

/// OpenAI-compatible chat + embeddings client
pub struct OpenAICompatClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
    embedding_dimensions: AtomicUsize,
    cache: Arc<EmbeddingCache>,
    metrics: Arc<APIMetrics>,
}

impl OpenAICompatClient {
    /// Create new client from configuration
    pub fn new(config: LLMServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let embedding_dimensions = AtomicUsize::new(config.embedding_dimensions.unwrap_or(0));

        Ok(Self {
            http_client,
            config,
            embedding_dimensions,
            cache: Arc::new(EmbeddingCache::new()),
            metrics: Arc::new(APIMetrics::default()),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(LLMServiceConfig::default())
    }

    pub fn config(&self) -> &LLMServiceConfig {
        &self.config
    }

    /// Get current API metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        let total = self.metrics.total_requests.load(Ordering::Relaxed);
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate: if lookups > 0 {
                hits as f64 / lookups as f64 * 100.0
            } else {
                0.0
            },
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn record_error(&self) {
        self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_latency(&self, start: Instant) {
        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key {
            Some(ref api_key) => req.header("Authorization", format!("Bearer {}", api_key)),
            None => req,
        }
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        self.record_error();
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(VibeError::ExternalError(format!(
            "{} service error (HTTP {}): {}",
            what, status, body
        )))
    }
}

#[async_trait]
impl LLMClient for OpenAICompatClient {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        #[derive(Serialize)]
        struct ChatRequest {
            model: String,
            messages: Vec<ChatMessage>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessage,
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/v1/chat/completions", self.config.url.trim_end_matches('/'));
        let req = self.authorize(self.http_client.post(&url).json(&request));

        let response = req.send().await.map_err(|e| {
            self.record_error();
            VibeError::Http(e)
        })?;
        let response = self.check_status(response, "LLM").await?;

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            self.record_error();
            VibeError::Http(e)
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                self.record_error();
                VibeError::Llm("No response from LLM".to_string())
            })?
            .message
            .content;

        self.record_latency(start);
        Ok(content)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = &self.config.embedding_model;
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut uncached_texts = Vec::new();
        let mut uncached_indices = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            if let Some(cached) = self.cache.get(model, text) {
                self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
                results.push(Some(cached));
                continue;
            }
            self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
            results.push(None);
            uncached_texts.push(text.clone());
            uncached_indices.push(i);
        }

        if !uncached_texts.is_empty() {
            tracing::debug!(
                "Embedding batch: {} cached, {} to fetch",
                texts.len() - uncached_texts.len(),
                uncached_texts.len()
            );

            let start = Instant::now();
            self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

            #[derive(Serialize)]
            struct EmbedRequest<'a> {
                model: &'a str,
                input: &'a [String],
            }

            #[derive(Deserialize)]
            struct EmbedResponse {
                data: Vec<EmbedData>,
            }

            #[derive(Deserialize)]
            struct EmbedData {
                embedding: Vec<f32>,
            }

            let request = EmbedRequest {
                model,
                input: &uncached_texts,
            };

            let url = format!(
                "{}/v1/embeddings",
                self.config.embeddings_url().trim_end_matches('/')
            );
            let req = self.authorize(self.http_client.post(&url).json(&request));

            let response = req.send().await.map_err(|e| {
                self.record_error();
                VibeError::Http(e)
            })?;
            let response = self.check_status(response, "Embedding").await?;

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                self.record_error();
                VibeError::Http(e)
            })?;

            if embed_response.data.len() != uncached_texts.len() {
                self.record_error();
                return Err(VibeError::Llm(format!(
                    "Embedding service returned {} vectors for {} inputs",
                    embed_response.data.len(),
                    uncached_texts.len()
                )));
            }

            let evicted = self.cache.cleanup_above(CACHE_CLEANUP_THRESHOLD);
            if evicted > 0 {
                tracing::debug!("Evicted {} expired embeddings", evicted);
            }

            for (i, data) in embed_response.data.into_iter().enumerate() {
                if self.embedding_dimensions.load(Ordering::Relaxed) == 0 {
                    self.embedding_dimensions
                        .store(data.embedding.len(), Ordering::Relaxed);
                }
                self.cache
                    .insert(model, &uncached_texts[i], data.embedding.clone());
                results[uncached_indices[i]] = Some(data.embedding);
            }

            self.record_latency(start);
        }

        results
            .into_iter()
            .map(|r| r.ok_or_else(|| VibeError::Llm("Missing embedding in batch".to_string())))
            .collect()
    }

    fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions.load(Ordering::Relaxed)
    }

    fn embedding_model_name(&self) -> &str {
        &self.config.embedding_model
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LLMServiceConfig {
        LLMServiceConfig {
            url: "http://127.0.0.1:9".to_string(),
            model: "test-chat".to_string(),
            embedding_url: None,
            embedding_model: "test-embed".to_string(),
            embedding_dimensions: Some(8),
            api_key: None,
            timeout_secs: 1,
            temperature: 0.0,
            max_tokens: 64,
        }
    }

    #[tokio::test]
    async fn test_empty_batch_skips_network() {
        let client = OpenAICompatClient::new(config()).unwrap();
        let vectors = client.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
        assert_eq!(client.metrics().total_requests, 0);
        assert_eq!(client.cache_stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_provider_error() {
        let client = OpenAICompatClient::new(config()).unwrap();
        let err = client.complete("sys", "hello").await.unwrap_err();
        assert!(err.is_provider_error());
        assert_eq!(client.metrics().total_errors, 1);
    }

    #[test]
    fn test_configured_dimensions() {
        let client = OpenAICompatClient::new(config()).unwrap();
        assert_eq!(client.embedding_dimensions(), 8);
        assert_eq!(client.model_name(), "test-chat");
        assert_eq!(client.embedding_model_name(), "test-embed");
    }
}
