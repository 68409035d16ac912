//! LLM integration
//!
//! Provides traits and implementations for:
//! - Embedding generation via OpenAI-compatible services
//! - Vibe tag classification
//! - Structured answers, vibe profiles and place Q&A
//! - Retry with backoff around provider calls

mod answer;
mod cache;
mod client;
mod http_embedder;
mod json;
mod place_qa;
mod retry;
mod tag_classifier;
mod traits;
mod vibe_profile;

pub use answer::{StructuredAnswerGenerator, MAX_CHUNKS_PER_SOURCE, RETRY_SENTINEL};
pub use cache::{CacheStats, EmbeddingCache};
pub use client::{APIMetrics, MetricsSnapshot, OpenAICompatClient};
pub use http_embedder::HttpEmbedder;
pub use json::{extract_json_object, parse_string_list, strip_code_fences};
pub use place_qa::{PlaceAnswer, PlaceQa, SourceReview, MAX_QA_REVIEWS};
pub use retry::{Attempt, RetryPolicy};
pub use tag_classifier::{TagClassifier, SUGGESTED_TAGS};
pub use traits::*;
pub use vibe_profile::{
    apply_profile, citations, quality_score, vibe_cards, Citation, VibeCard, VibeProfiler,
};
