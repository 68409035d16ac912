//! vibenav core library
//!
//! Retrieval-augmented question answering over collected place reviews.
//!
//! # Features
//! - Overlapping review chunking with noise-line cleanup
//! - Cosine-similarity and MMR search over a persisted vector index
//! - LLM vibe tagging, vibe profiles and place Q&A
//! - Query routing by tag and place, with structured JSON answers
//! - Retry with exponential backoff around provider calls

pub mod config;
pub mod error;
pub mod index;
pub mod llm;
pub mod pipeline;
pub mod places;
pub mod search;
pub mod service;

pub use config::{ChunkingConfig, Config, LLMServiceConfig, RetrievalConfig, RetryConfig};
pub use error::{Error, Result, VibeError};
pub use index::{chunk_text, ChunkDocument, ChunkMetadata, SearchHit, VectorIndex};
pub use llm::{
    ChatMessage, Embedder, HttpEmbedder, LLMClient, MetricsSnapshot, OpenAICompatClient,
    PlaceAnswer, PlaceQa, RetryPolicy, StructuredAnswerGenerator, TagClassifier, VibeCard,
    VibeProfiler,
};
pub use pipeline::{IndexingPipeline, PipelineOptions, PipelineStats};
pub use places::{Place, PlaceCatalog, Review, ReviewSource};
pub use search::{PlaceSelection, QueryRouter, RouteOutcome, SearchMode, SearchOptions};
pub use service::{QueryResponse, ServiceStatus, VibeService};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "vibenav";
