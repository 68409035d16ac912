//! Structured JSON answers about a routed place

use super::json::extract_json_object;
use super::{Attempt, LLMClient, RetryPolicy};
use crate::error::Result;
use crate::index::SearchHit;
use crate::places::{Place, ReviewSource};
use serde_json::{json, Value};
use std::sync::Arc;

/// Chunks quoted per review source
pub const MAX_CHUNKS_PER_SOURCE: usize = 5;

/// Reddit thread links included in the answer schema
const MAX_THREAD_LINKS: usize = 3;

/// Returned when every attempt produced unparseable output
pub const RETRY_SENTINEL: &str = "Could not generate valid response after retries";

const SYSTEM_PROMPT: &str = "You are a helpful city guide. Respond ONLY with a single JSON \
object following the requested format.";

/// Prompts the model with a place's retrieved chunks and parses a JSON answer
pub struct StructuredAnswerGenerator {
    client: Arc<dyn LLMClient>,
    retry: RetryPolicy,
}

impl StructuredAnswerGenerator {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Answer skeleton the model is asked to fill in
    pub fn output_schema(place: &Place) -> Value {
        json!({
            "name": place.name,
            "address": place.address,
            "rating": place.rating,
            "review_count": place.reviews_count,
            "tags": place.tags,
            "location": {
                "latitude": place.coordinates.map(|c| c.latitude),
                "longitude": place.coordinates.map(|c| c.longitude),
            },
            "links": {
                "google_maps": place.maps_url(),
                "reddit_threads": place.reddit_thread_urls(MAX_THREAD_LINKS),
            },
            "summary": "A concise summary of the place's vibe based on reviews...",
            "key_features": [
                "List 3-5 most notable features",
                "Focus on aspects relevant to user query"
            ]
        })
    }

    pub fn build_prompt(place: &Place, chunks: &[SearchHit], query: &str) -> String {
        let quote = |hit: &SearchHit| hit.document.text.replace('\n', " ").trim().to_string();

        let google = chunks
            .iter()
            .filter(|h| h.document.metadata.review_source == ReviewSource::Google)
            .take(MAX_CHUNKS_PER_SOURCE)
            .map(|h| format!("- \"{}\"", quote(h)))
            .collect::<Vec<_>>()
            .join("\n");

        let reddit = chunks
            .iter()
            .filter(|h| h.document.metadata.review_source == ReviewSource::Reddit)
            .take(MAX_CHUNKS_PER_SOURCE)
            .map(|h| format!("- \"{}\" (from: {})", quote(h), h.document.metadata.url))
            .collect::<Vec<_>>()
            .join("\n");

        let schema = serde_json::to_string_pretty(&Self::output_schema(place))
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            r#"Analyze the following place based on user reviews and provide a comprehensive response in JSON format.

Place: {name}
Location: {address}
User Query: "{query}"

=== REVIEW SUMMARY ===
Google Reviews:
{google}

Reddit Comments:
{reddit}

=== OUTPUT FORMAT ===
{schema}
"#,
            name = place.name,
            address = place.address.as_deref().unwrap_or("unknown"),
        )
    }

    /// Generate and parse an answer.
    ///
    /// Unparseable output is retried with backoff; once attempts run out the
    /// sentinel `{"error": ...}` object is returned. A provider error on the
    /// last attempt is returned as `Err`.
    pub async fn generate(
        &self,
        place: &Place,
        chunks: &[SearchHit],
        query: &str,
    ) -> Result<Value> {
        let prompt = Self::build_prompt(place, chunks, query);
        self.generate_from_prompt(&prompt).await
    }

    pub async fn generate_from_prompt(&self, prompt: &str) -> Result<Value> {
        let client = &self.client;

        let answer = self
            .retry
            .run("structured answer", |_| async move {
                let raw = client.complete(SYSTEM_PROMPT, prompt).await?;
                Ok(match extract_json_object(&raw) {
                    Some(value) => Attempt::Done(value),
                    None => Attempt::Retry(format!("no JSON object in {} chars", raw.len())),
                })
            })
            .await?;

        Ok(answer.unwrap_or_else(|| json!({ "error": RETRY_SENTINEL })))
    }
}
