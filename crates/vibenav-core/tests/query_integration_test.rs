//! End-to-end query tests with in-process providers
//!
//! Tests:
//! 1. Indexing places and loading them into the service
//! 2. Tag-filtered routing to the single matching place
//! 3. Empty tag-filter results reported in the answer
//! 4. Retry bound and sentinel for malformed model output
//! 5. Save/load round trip preserving search results
//! 6. Embedder/index dimension mismatch reported as an error

use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vibenav_core::config::Config;
use vibenav_core::error::{Result, VibeError};
use vibenav_core::llm::{ChatMessage, Embedder, LLMClient, RETRY_SENTINEL};
use vibenav_core::pipeline::{IndexingPipeline, PipelineOptions};
use vibenav_core::places::{save_places, GoogleReview, Place, RedditComment, RedditThread};
use vibenav_core::{VectorIndex, VibeService};

const DIMS: usize = 64;

/// Bag-of-words embedder: each lowercase word bumps one hashed bucket
struct WordHashEmbedder;

fn bucket(word: &str) -> usize {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in word.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % DIMS as u64) as usize
}

fn embed_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        v[bucket(&word.to_lowercase())] += 1.0;
    }
    v
}

#[async_trait]
impl Embedder for WordHashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(embed_words(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| embed_words(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model_name(&self) -> &str {
        "word-hash"
    }
}

/// Same words, fewer buckets: stands in for a swapped embedding model
struct NarrowEmbedder;

#[async_trait]
impl Embedder for NarrowEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(embed_words(text)[..8].to_vec())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        8
    }

    fn model_name(&self) -> &str {
        "narrow"
    }
}

/// Answers with the place named on the prompt's `Place:` line
struct EchoPlaceLlm {
    calls: AtomicUsize,
}

#[async_trait]
impl LLMClient for EchoPlaceLlm {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = &messages[messages.len() - 1].content;
        let name = prompt
            .lines()
            .find_map(|l| l.strip_prefix("Place: "))
            .unwrap_or("unknown");
        Ok(format!(
            "```json\n{}\n```",
            json!({ "name": name, "summary": "fits the request" })
        ))
    }

    fn model_name(&self) -> &str {
        "echo-place"
    }
}

/// Never produces JSON
struct ChattyLlm {
    calls: AtomicUsize,
}

#[async_trait]
impl LLMClient for ChattyLlm {
    async fn chat_completion(&self, _messages: Vec<ChatMessage>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Happy to help! This gym is great.".to_string())
    }

    fn model_name(&self) -> &str {
        "chatty"
    }
}

fn gym(name: &str, tags: &[&str], reviews: &[&str]) -> Place {
    Place {
        name: name.to_string(),
        address: Some(format!("{} Road, Pune", name)),
        city: Some("pune".to_string()),
        category: Some("gym".to_string()),
        source_url: Some(format!("ChIJ{}", name.replace(' ', ""))),
        rating: Some(4.3),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        google_reviews: reviews
            .iter()
            .map(|r| GoogleReview {
                text: r.to_string(),
                author: Some("Reviewer".to_string()),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn gyms() -> Vec<Place> {
    let mut flex = gym(
        "Flex Studio",
        &["yoga", "peaceful"],
        &["Calm space with a yoga friendly instructor and good mats"],
    );
    flex.reddit_comments = vec![RedditThread {
        title: "Best gyms in Pune".to_string(),
        url: "https://www.reddit.com/r/pune/comments/abc/best_gyms/".to_string(),
        all_comments: vec![RedditComment {
            text: "Flex Studio has a yoga batch every morning".to_string(),
            permalink: Some(
                "https://www.reddit.com/r/pune/comments/abc/best_gyms/c1/".to_string(),
            ),
            ..Default::default()
        }],
        ..Default::default()
    }];

    vec![
        gym(
            "Iron Paradise",
            &["crowded", "modern"],
            &["Heavy lifting gym, yoga friendly gym claims but no yoga classes"],
        ),
        flex,
        gym(
            "Pulse Fitness",
            &["lively", "music"],
            &["Zumba and loud music, a friendly gym for cardio"],
        ),
    ]
}

/// Index the sample gyms without classification and write the place file
async fn build_fixture(dir: &Path) -> (PathBuf, PathBuf) {
    let places_file = dir.join("gym_pune_combined_tagged.json");
    let index_dir = dir.join("vibe_vectorstore");

    let options = PipelineOptions {
        classify: false,
        index_dir: index_dir.clone(),
        ..Default::default()
    };
    let (places, index, stats) = IndexingPipeline::new(&WordHashEmbedder)
        .index_places(gyms(), &options, None)
        .await
        .unwrap();
    assert_eq!(stats.places, 3);
    assert_eq!(index.len(), 4);

    save_places(&places_file, &places).unwrap();
    (index_dir, places_file)
}

fn service(llm: Arc<dyn LLMClient>) -> VibeService {
    VibeService::new(Arc::new(WordHashEmbedder), llm, Config::default())
}

#[tokio::test]
async fn test_yoga_query_routes_to_tagged_gym() {
    let dir = tempfile::tempdir().unwrap();
    let (index_dir, places_file) = build_fixture(dir.path()).await;

    let llm = Arc::new(EchoPlaceLlm {
        calls: AtomicUsize::new(0),
    });
    let service = service(llm.clone());
    service.load(&index_dir, &places_file).await.unwrap();

    let response = service
        .query("Suggest a yoga-friendly gym in Pune", &["Yoga ".to_string()])
        .await
        .unwrap();

    assert!(!response.is_error());
    assert_eq!(response.place_name.as_deref(), Some("Flex Studio"));
    assert_eq!(response.answer["name"], "Flex Studio");
    assert_eq!(response.matched_chunks.len(), 2);
    assert!(response
        .matched_chunks
        .iter()
        .all(|c| c.document.metadata.source == "Flex Studio"));
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unmatched_tags_report_no_places() {
    let dir = tempfile::tempdir().unwrap();
    let (index_dir, places_file) = build_fixture(dir.path()).await;

    let llm = Arc::new(EchoPlaceLlm {
        calls: AtomicUsize::new(0),
    });
    let service = service(llm.clone());
    service.load(&index_dir, &places_file).await.unwrap();

    let response = service
        .query("romantic dinner", &["romantic".to_string()])
        .await
        .unwrap();

    assert!(response.is_error());
    assert_eq!(response.answer["error"], "No relevant places found.");
    assert!(response.matched_chunks.is_empty());
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_answers_hit_retry_bound() {
    let dir = tempfile::tempdir().unwrap();
    let (index_dir, places_file) = build_fixture(dir.path()).await;

    let llm = Arc::new(ChattyLlm {
        calls: AtomicUsize::new(0),
    });
    let service = service(llm.clone());
    service.load(&index_dir, &places_file).await.unwrap();

    let response = service.query("yoga gym", &[]).await.unwrap();

    assert_eq!(response.answer, json!({ "error": RETRY_SENTINEL }));
    assert_eq!(
        llm.calls.load(Ordering::SeqCst),
        Config::default().retry.answer.max_attempts as usize
    );
}

#[tokio::test]
async fn test_mismatched_embedder_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (index_dir, places_file) = build_fixture(dir.path()).await;

    let llm = Arc::new(EchoPlaceLlm {
        calls: AtomicUsize::new(0),
    });
    let service = VibeService::new(Arc::new(NarrowEmbedder), llm.clone(), Config::default());
    service.load(&index_dir, &places_file).await.unwrap();

    let err = service.query("yoga gym", &[]).await.unwrap_err();
    assert!(matches!(err, VibeError::Index(ref m) if m.contains("8 dimensions")));
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_query_before_load() {
    let llm = Arc::new(EchoPlaceLlm {
        calls: AtomicUsize::new(0),
    });
    let err = service(llm).query("anything", &[]).await.unwrap_err();
    assert!(matches!(err, VibeError::IndexNotLoaded));
}

#[tokio::test]
async fn test_saved_index_searches_identically() {
    let dir = tempfile::tempdir().unwrap();
    let (index_dir, _) = build_fixture(dir.path()).await;

    let loaded = VectorIndex::load(&index_dir).unwrap();
    let rebuilt = VectorIndex::from_parts(
        loaded.model(),
        loaded.documents().to_vec(),
        loaded.vectors().to_vec(),
    )
    .unwrap();

    for query in ["yoga mats", "loud zumba music", "heavy lifting"] {
        let a = loaded
            .similarity_search(&WordHashEmbedder, query, 3)
            .await
            .unwrap();
        let b = rebuilt
            .similarity_search(&WordHashEmbedder, query, 3)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    let reddit = loaded
        .documents()
        .iter()
        .find(|d| d.metadata.url.contains("reddit.com"))
        .unwrap();
    assert!(reddit.metadata.url.ends_with("/c1/"));
}

#[tokio::test]
async fn test_rebuild_replaces_state() {
    let dir = tempfile::tempdir().unwrap();
    let places_file = dir.path().join("gym_pune_combined.json");
    save_places(&places_file, &gyms()).unwrap();

    let llm = Arc::new(EchoPlaceLlm {
        calls: AtomicUsize::new(0),
    });
    let config = Config {
        index_dir: dir.path().join("index"),
        ..Default::default()
    };
    let service = VibeService::new(Arc::new(WordHashEmbedder), llm, config);

    let stats = service.rebuild(&places_file, false).await.unwrap();
    assert_eq!(stats.chunks, 4);

    let status = service.status().await;
    assert!(status.loaded);
    assert_eq!(status.places, 3);
    assert_eq!(status.chunks, 4);
    assert!(dir.path().join("index").join("docstore.json").exists());
}
