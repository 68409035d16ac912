//! Free-form questions about one named place

use super::{Attempt, LLMClient, RetryPolicy};
use crate::error::{Result, VibeError};
use crate::places::{Place, PlaceCatalog, ReviewSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reviews handed to the model
pub const MAX_QA_REVIEWS: usize = 15;

/// Reviews echoed back with the answer
const MAX_SOURCE_REVIEWS: usize = 5;

const SYSTEM_PROMPT: &str = "You're a location expert. Analyze the provided reviews and answer \
the user's question in detail. Include specific review excerpts with [citation] markers. \
Provide links to original sources when available.";

/// A review as shown to the model and returned for reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReview {
    pub text: String,
    pub source: ReviewSource,
    pub author: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceAnswer {
    pub location: String,
    pub query: String,
    pub answer: String,
    pub source_reviews: Vec<SourceReview>,
}

/// Answers questions from all of a place's reviews, not just retrieved chunks
pub struct PlaceQa {
    client: Arc<dyn LLMClient>,
    retry: RetryPolicy,
}

impl PlaceQa {
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

    pub fn source_reviews(place: &Place) -> Vec<SourceReview> {
        place
            .reviews()
            .into_iter()
            .take(MAX_QA_REVIEWS)
            .map(|r| SourceReview {
                text: r.text,
                source: r.source,
                author: r.author,
                url: r.url,
            })
            .collect()
    }

    pub fn build_prompt(
        place: &Place,
        question: &str,
        reviews: &[SourceReview],
    ) -> Result<String> {
        let reviews_json = serde_json::to_string_pretty(reviews)?;
        Ok(format!(
            "Question: {question}\n\nAbout: {name} in {city} ({category})\n\nReviews:\n{reviews_json}\n\nProvide a detailed answer with citations and links:",
            name = place.name,
            city = place.city_or_unknown(),
            category = place.category.as_deref().unwrap_or("place"),
        ))
    }

    pub async fn answer(&self, place: &Place, question: &str) -> Result<PlaceAnswer> {
        let reviews = Self::source_reviews(place);
        let prompt = Self::build_prompt(place, question, &reviews)?;
        tracing::debug!(
            "Asking about '{}' with {} reviews",
            place.name,
            reviews.len()
        );

        let label = format!("place Q&A '{}'", place.name);
        let client = &self.client;
        let prompt = &prompt;
        let answer = self
            .retry
            .run(&label, |_| async move {
                Ok(Attempt::Done(client.complete(SYSTEM_PROMPT, prompt).await?))
            })
            .await?
            .unwrap_or_default();

        Ok(PlaceAnswer {
            location: place.name.clone(),
            query: question.to_string(),
            answer: answer.trim().to_string(),
            source_reviews: reviews.into_iter().take(MAX_SOURCE_REVIEWS).collect(),
        })
    }

    /// Look the place up by name, then answer
    pub async fn answer_by_name(
        &self,
        catalog: &PlaceCatalog,
        name: &str,
        question: &str,
    ) -> Result<PlaceAnswer> {
        let place = catalog
            .find_by_name(name)
            .ok_or_else(|| VibeError::PlaceNotFound(name.to_string()))?;
        self.answer(place, question).await
    }
}
