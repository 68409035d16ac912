//! Vibe tag extraction for places

use super::json::parse_string_list;
use super::{Attempt, LLMClient, RetryPolicy};
use crate::error::Result;
use crate::places::Place;
use std::sync::Arc;

/// Suggested (not enforced) vocabulary shared across categories
pub const SUGGESTED_TAGS: &[&str] = &[
    "budget-friendly",
    "aesthetic",
    "lively",
    "quiet",
    "family-friendly",
    "cozy",
    "spacious",
    "premium",
    "crowded",
    "peaceful",
    "healthy-options",
    "music",
    "zumba",
    "yoga",
    "late-night",
    "outdoor-seating",
    "fast-service",
    "pet-friendly",
    "romantic",
    "group-friendly",
    "modern",
    "traditional",
    "luxury",
    "noisy",
    "clean",
];

const SYSTEM_PROMPT: &str = "You are a vibe classifier for city locations such as cafes, \
restaurants, gyms, etc. Respond ONLY with a JSON list of strings.";

/// Classifies a place's reviews into a handful of vibe tags
pub struct TagClassifier {
    client: Arc<dyn LLMClient>,
    retry: RetryPolicy,
}

impl TagClassifier {
    /// Single attempt, matching the historic no-retry behaviour
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build_prompt(name: &str, city: &str, reviews: &str) -> String {
        let examples = SUGGESTED_TAGS
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"Given the following reviews for a place called "{name}" in {city}, extract 3-6 vibe-related tags that best describe the experience of the location.

Use lowercase, dash-separated words.

Only choose tags from a consistent predefined set that applies across all categories (e.g., cafes, restaurants, gyms).

Examples of valid tags: {examples}.

Only output the tags in the form of a JSON list.

Reviews:
{reviews}
"#
        )
    }

    /// Extract tags from raw review text.
    ///
    /// Unparseable output degrades to an empty list; provider failures are
    /// retried per policy and returned once exhausted.
    pub async fn classify(&self, name: &str, city: &str, reviews: &str) -> Result<Vec<String>> {
        let prompt = Self::build_prompt(name, city, reviews);
        let label = format!("tagging '{}'", name);
        let client = &self.client;
        let prompt = &prompt;

        let raw = self
            .retry
            .run(&label, |_| async move {
                let raw = client.complete(SYSTEM_PROMPT, prompt).await?;
                Ok(Attempt::Done(raw))
            })
            .await?
            .unwrap_or_default();

        match parse_string_list(&raw) {
            Some(tags) => {
                tracing::debug!("Tagged '{}': {:?}", name, tags);
                Ok(dedup(tags))
            }
            None => {
                tracing::warn!("Failed to parse tags for '{}'. Raw: {}", name, raw);
                Ok(Vec::new())
            }
        }
    }

    pub async fn classify_place(&self, place: &Place) -> Result<Vec<String>> {
        self.classify(
            &place.name,
            place.city_or_unknown(),
            &place.combined_review_text(),
        )
        .await
    }
}

fn dedup(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
