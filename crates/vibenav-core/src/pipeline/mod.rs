//! Offline indexing pipeline
//!
//! Load places, classify (and optionally profile) each one, write the tagged
//! place file, chunk every review, embed and save the vector index. A failure
//! for one place is recorded on that place and does not stop the run.

use crate::config::ChunkingConfig;
use crate::error::{Result, VibeError};
use crate::index::{chunk_places, BuildProgress, VectorIndex};
use crate::llm::{apply_profile, Embedder, TagClassifier, VibeProfiler};
use crate::places::{assign_ids, load_places, save_places, tagged_path, Place};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default number of places classified concurrently
pub const DEFAULT_WORKERS: usize = 2;

/// Pipeline options
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Places classified concurrently (1 = sequential)
    pub workers: usize,
    /// Run the tag classifier; off when the input is already tagged
    pub classify: bool,
    /// Also generate vibe profiles
    pub profile: bool,
    pub chunking: ChunkingConfig,
    /// Where the vector index is saved
    pub index_dir: PathBuf,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            classify: true,
            profile: false,
            chunking: ChunkingConfig::default(),
            index_dir: PathBuf::from(crate::config::DEFAULT_INDEX_DIR),
        }
    }
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub places: usize,
    pub tagged: usize,
    pub profiled: usize,
    pub failed: usize,
    pub chunks: usize,
}

/// Everything a run produced
pub struct PipelineOutput {
    pub places: Vec<Place>,
    pub index: VectorIndex,
    pub stats: PipelineStats,
    /// Tagged place file, when one was written
    pub tagged_file: Option<PathBuf>,
}

/// Per-place outcome of the enrichment stage
struct Enrichment {
    tags: Option<Result<Vec<String>>>,
    profile: Option<Result<serde_json::Value>>,
}

/// Drives classification, chunking and index construction
pub struct IndexingPipeline<'a> {
    embedder: &'a dyn Embedder,
    classifier: Option<&'a TagClassifier>,
    profiler: Option<&'a VibeProfiler>,
}

impl<'a> IndexingPipeline<'a> {
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self {
            embedder,
            classifier: None,
            profiler: None,
        }
    }

    pub fn with_classifier(mut self, classifier: &'a TagClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_profiler(mut self, profiler: &'a VibeProfiler) -> Self {
        self.profiler = Some(profiler);
        self
    }

    /// Classify and profile places with bounded concurrency, in place.
    /// Failures set `processing_error` and leave `tags` empty.
    pub async fn enrich(&self, places: &mut [Place], options: &PipelineOptions) -> PipelineStats {
        let classify = options.classify && self.classifier.is_some();
        let profile = options.profile && self.profiler.is_some();
        let workers = options.workers.max(1);

        let outcomes: Vec<Enrichment> = stream::iter(places.iter())
            .map(|place| async move {
                let tags = match (classify, self.classifier) {
                    (true, Some(c)) => Some(c.classify_place(place).await),
                    _ => None,
                };
                let profile = match (profile, self.profiler) {
                    (true, Some(p)) => Some(p.profile(place).await),
                    _ => None,
                };
                Enrichment { tags, profile }
            })
            .buffered(workers)
            .collect()
            .await;

        let mut stats = PipelineStats {
            places: places.len(),
            ..Default::default()
        };

        for (place, outcome) in places.iter_mut().zip(outcomes) {
            let mut errors: Vec<String> = Vec::new();

            match outcome.tags {
                Some(Ok(tags)) => {
                    if !tags.is_empty() {
                        stats.tagged += 1;
                    }
                    place.tags = tags;
                }
                Some(Err(e)) => {
                    tracing::warn!("Tagging failed for '{}': {}", place.name, e);
                    place.tags = Vec::new();
                    errors.push(format!("tagging: {}", e));
                }
                None => {}
            }

            match outcome.profile {
                Some(Ok(value)) => {
                    apply_profile(place, value);
                    stats.profiled += 1;
                }
                Some(Err(e)) => {
                    tracing::warn!("Profiling failed for '{}': {}", place.name, e);
                    errors.push(format!("profile: {}", e));
                }
                None => {}
            }

            if errors.is_empty() {
                place.processing_error = None;
            } else {
                stats.failed += 1;
                place.processing_error = Some(errors.join("; "));
            }
        }

        tracing::info!(
            "Enriched {} places ({} tagged, {} failed)",
            stats.places,
            stats.tagged,
            stats.failed
        );
        stats
    }

    /// Enrich `places`, then chunk, embed and save the index
    pub async fn index_places(
        &self,
        mut places: Vec<Place>,
        options: &PipelineOptions,
        progress: Option<&(dyn Fn(BuildProgress) + Send + Sync)>,
    ) -> Result<(Vec<Place>, VectorIndex, PipelineStats)> {
        if options.chunking.chunk_overlap >= options.chunking.chunk_size {
            return Err(VibeError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                options.chunking.chunk_overlap, options.chunking.chunk_size
            )));
        }

        assign_ids(&mut places);
        let mut stats = self.enrich(&mut places, options).await;

        let chunks = chunk_places(&places, &options.chunking);
        stats.chunks = chunks.len();
        tracing::info!("Split {} places into {} chunks", places.len(), chunks.len());

        let index = VectorIndex::build(chunks, self.embedder, progress).await?;
        index.save(&options.index_dir)?;

        Ok((places, index, stats))
    }

    /// Full run from a place file. The enriched places are written next to
    /// the input as `<stem>_tagged.json` when any enrichment ran.
    pub async fn run(
        &self,
        input: &Path,
        options: &PipelineOptions,
        progress: Option<&(dyn Fn(BuildProgress) + Send + Sync)>,
    ) -> Result<PipelineOutput> {
        let places = load_places(input)?;
        let enriching = (options.classify && self.classifier.is_some())
            || (options.profile && self.profiler.is_some());

        let (places, index, stats) = self.index_places(places, options, progress).await?;

        let tagged_file = if enriching {
            let path = tagged_path(input);
            save_places(&path, &places)?;
            tracing::info!("Tagged places written to {}", path.display());
            Some(path)
        } else {
            None
        };

        Ok(PipelineOutput {
            places,
            index,
            stats,
            tagged_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, LLMClient};
    use crate::places::GoogleReview;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct WordEmbedder;

    #[async_trait]
    impl Embedder for WordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "words"
        }
    }

    /// Fails for any prompt mentioning "Broken", tags everything else "cozy"
    struct PickyLlm;

    #[async_trait]
    impl LLMClient for PickyLlm {
        async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
            let prompt = &messages[1].content;
            if prompt.contains("Broken") {
                Err(VibeError::ExternalError("rate limited".into()))
            } else {
                Ok("[\"cozy\"]".to_string())
            }
        }

        fn model_name(&self) -> &str {
            "picky"
        }
    }

    fn place(name: &str) -> Place {
        Place {
            name: name.to_string(),
            google_reviews: vec![GoogleReview {
                text: format!("{} has lovely window seats", name),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_place() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = TagClassifier::new(Arc::new(PickyLlm));
        let options = PipelineOptions {
            index_dir: dir.path().join("index"),
            ..Default::default()
        };

        let (places, index, stats) = IndexingPipeline::new(&WordEmbedder)
            .with_classifier(&classifier)
            .index_places(
                vec![place("Alpha"), place("Broken Cafe"), place("Gamma")],
                &options,
                None,
            )
            .await
            .unwrap();

        assert_eq!(stats.places, 3);
        assert_eq!(stats.tagged, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.chunks, 3);

        assert_eq!(places[0].tags, vec!["cozy"]);
        assert!(places[1].tags.is_empty());
        assert!(places[1]
            .processing_error
            .as_deref()
            .unwrap()
            .contains("rate limited"));
        assert_eq!(places[2].tags, vec!["cozy"]);
        assert!(places.iter().all(|p| !p.id.is_empty()));

        assert_eq!(index.len(), 3);
        assert!(VectorIndex::load(&options.index_dir).is_ok());
    }

    #[tokio::test]
    async fn test_run_writes_tagged_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cafe_pune_combined.json");
        save_places(&input, &[place("Alpha"), place("Beta")]).unwrap();

        let classifier = TagClassifier::new(Arc::new(PickyLlm));
        let options = PipelineOptions {
            workers: 1,
            index_dir: dir.path().join("index"),
            ..Default::default()
        };
        let output = IndexingPipeline::new(&WordEmbedder)
            .with_classifier(&classifier)
            .run(&input, &options, None)
            .await
            .unwrap();

        let tagged = output.tagged_file.unwrap();
        assert!(tagged.ends_with("cafe_pune_combined_tagged.json"));
        let reloaded = load_places(&tagged).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.iter().all(|p| p.tags == vec!["cozy"]));
        assert_eq!(reloaded[0].id, output.places[0].id);
    }

    #[tokio::test]
    async fn test_retagging_rewrites_tagged_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cafe_pune_combined_tagged.json");
        save_places(&input, &[place("Alpha")]).unwrap();

        let classifier = TagClassifier::new(Arc::new(PickyLlm));
        let options = PipelineOptions {
            index_dir: dir.path().join("index"),
            ..Default::default()
        };
        let output = IndexingPipeline::new(&WordEmbedder)
            .with_classifier(&classifier)
            .run(&input, &options, None)
            .await
            .unwrap();

        assert_eq!(output.tagged_file.as_deref(), Some(input.as_path()));
        assert!(!dir
            .path()
            .join("cafe_pune_combined_tagged_tagged.json")
            .exists());
        assert_eq!(load_places(&input).unwrap()[0].tags, vec!["cozy"]);
    }

    #[tokio::test]
    async fn test_no_reviews_gives_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let options = PipelineOptions {
            classify: false,
            index_dir: dir.path().join("index"),
            ..Default::default()
        };
        let empty = Place {
            name: "Empty".to_string(),
            ..Default::default()
        };
        let (_, index, stats) = IndexingPipeline::new(&WordEmbedder)
            .index_places(vec![empty], &options, None)
            .await
            .unwrap();
        assert_eq!(stats.chunks, 0);
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_bad_chunking_rejected() {
        let options = PipelineOptions {
            chunking: ChunkingConfig {
                chunk_size: 100,
                chunk_overlap: 100,
            },
            ..Default::default()
        };
        let result = IndexingPipeline::new(&WordEmbedder)
            .index_places(vec![place("Alpha")], &options, None)
            .await;
        assert!(matches!(result, Err(VibeError::Config(_))));
    }
}
