//! Long-lived query service
//!
//! Holds the loaded vector index and place catalog behind a read-write lock.
//! Queries share read access; loading and rebuilding swap the state under
//! the write lock.

use crate::config::Config;
use crate::error::{Result, VibeError};
use crate::index::{SearchHit, VectorIndex};
use crate::llm::{Embedder, LLMClient, StructuredAnswerGenerator, TagClassifier};
use crate::pipeline::{IndexingPipeline, PipelineOptions, PipelineStats};
use crate::places::PlaceCatalog;
use crate::search::{QueryRouter, RouteOutcome};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

struct LoadedState {
    index: VectorIndex,
    catalog: PlaceCatalog,
    places_file: PathBuf,
}

/// Answer to one routed query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Id of the place the query was routed to
    pub place_id: Option<String>,
    pub place_name: Option<String>,
    pub matched_chunks: Vec<SearchHit>,
    /// Parsed model answer, or an `{"error": ...}` object
    pub answer: Value,
}

impl QueryResponse {
    fn error(message: String) -> Self {
        Self {
            place_id: None,
            place_name: None,
            matched_chunks: Vec::new(),
            answer: json!({ "error": message }),
        }
    }

    /// Whether the answer is an error object
    pub fn is_error(&self) -> bool {
        self.answer.get("error").is_some()
    }
}

/// Summary of what the service has loaded
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub loaded: bool,
    pub chunks: usize,
    pub places: usize,
    pub dimensions: usize,
    pub model: Option<String>,
    pub places_file: Option<PathBuf>,
}

pub struct VibeService {
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LLMClient>,
    config: Config,
    state: RwLock<Option<LoadedState>>,
}

impl VibeService {
    pub fn new(embedder: Arc<dyn Embedder>, llm: Arc<dyn LLMClient>, config: Config) -> Self {
        Self {
            embedder,
            llm,
            config,
            state: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load a saved index and its place file, replacing any loaded state
    pub async fn load(&self, index_dir: &Path, places_file: &Path) -> Result<()> {
        let index = VectorIndex::load(index_dir)?;
        let catalog = PlaceCatalog::load(places_file)?;
        tracing::info!(
            "Service loaded {} chunks over {} places",
            index.len(),
            catalog.len()
        );

        *self.state.write().await = Some(LoadedState {
            index,
            catalog,
            places_file: places_file.to_path_buf(),
        });
        Ok(())
    }

    pub async fn status(&self) -> ServiceStatus {
        match self.state.read().await.as_ref() {
            Some(state) => ServiceStatus {
                loaded: true,
                chunks: state.index.len(),
                places: state.catalog.len(),
                dimensions: state.index.dimensions(),
                model: Some(state.index.model().to_string()),
                places_file: Some(state.places_file.clone()),
            },
            None => ServiceStatus {
                loaded: false,
                chunks: 0,
                places: 0,
                dimensions: 0,
                model: None,
                places_file: None,
            },
        }
    }

    /// Route a question to one place and generate a structured answer.
    ///
    /// "No relevant places" and "details not found" are reported in the
    /// answer's `error` field, not as `Err`.
    pub async fn query(&self, query: &str, required_tags: &[String]) -> Result<QueryResponse> {
        let guard = self.state.read().await;
        let state = guard.as_ref().ok_or(VibeError::IndexNotLoaded)?;

        let router = QueryRouter::from_config(&self.config.retrieval);
        let outcome = router
            .route(
                &state.index,
                &state.catalog,
                self.embedder.as_ref(),
                query,
                required_tags,
            )
            .await?;

        let (place, chunks) = match outcome {
            RouteOutcome::Routed { place, chunks } => (place, chunks),
            RouteOutcome::NoRelevantPlaces => {
                return Ok(QueryResponse::error("No relevant places found.".to_string()))
            }
            RouteOutcome::DetailsNotFound(name) => {
                return Ok(QueryResponse::error(format!(
                    "Details for place '{}' not found.",
                    name
                )))
            }
        };
        drop(guard);

        tracing::info!("Routed query to '{}' ({} chunks)", place.name, chunks.len());
        let generator = StructuredAnswerGenerator::new(self.llm.clone())
            .with_retry(self.config.retry.answer.policy());
        let answer = generator.generate(&place, &chunks, query).await?;

        Ok(QueryResponse {
            place_id: Some(place.id),
            place_name: Some(place.name),
            matched_chunks: chunks,
            answer,
        })
    }

    /// Re-run the indexing pipeline over a place file and swap in the result
    pub async fn rebuild(&self, places_file: &Path, classify: bool) -> Result<PipelineStats> {
        let classifier = TagClassifier::new(self.llm.clone())
            .with_retry(self.config.retry.tagging.policy());
        let options = PipelineOptions {
            classify,
            chunking: self.config.chunking,
            index_dir: self.config.index_dir.clone(),
            ..Default::default()
        };

        let mut guard = self.state.write().await;
        let output = IndexingPipeline::new(self.embedder.as_ref())
            .with_classifier(&classifier)
            .run(places_file, &options, None)
            .await?;

        let catalog_file = output
            .tagged_file
            .clone()
            .unwrap_or_else(|| places_file.to_path_buf());
        *guard = Some(LoadedState {
            index: output.index,
            catalog: PlaceCatalog::new(output.places),
            places_file: catalog_file,
        });

        Ok(output.stats)
    }
}
