//! Retrieval over the vector index
//!
//! Provides:
//! - Similarity and MMR chunk search with tag filtering
//! - Grouping of hits by place
//! - Query routing to a single place

mod router;

pub use router::*;

use crate::error::{Result, VibeError};
use crate::index::{SearchHit, VectorIndex};
use crate::llm::Embedder;
use serde::{Deserialize, Serialize};

/// How to pick one place when several survive the tag filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceSelection {
    /// Place of the best-ranked chunk
    #[default]
    RetrievalOrder,
    /// Place with the highest single chunk score
    MaxScore,
    /// Place with the highest summed chunk score
    SumScore,
}

impl std::str::FromStr for PlaceSelection {
    type Err = VibeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "retrieval-order" => Ok(Self::RetrievalOrder),
            "max-score" => Ok(Self::MaxScore),
            "sum-score" => Ok(Self::SumScore),
            other => Err(VibeError::Parse(format!(
                "unknown selection '{}' (expected retrieval-order, max-score or sum-score)",
                other
            ))),
        }
    }
}

/// Chunk retrieval strategy
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SearchMode {
    #[default]
    Similarity,
    /// Maximal marginal relevance with the given candidate pool and lambda
    Mmr { fetch_k: usize, lambda: f32 },
}

/// Search options
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Maximum number of results
    pub limit: usize,
    pub mode: SearchMode,
    /// Keep only chunks carrying one of these tags (empty keeps all)
    pub tags: Vec<String>,
}

/// Trim, lowercase and drop empty tags
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Keep hits whose place tags intersect `tags`; no tags keeps everything
pub fn filter_by_tags(hits: Vec<SearchHit>, tags: &[String]) -> Vec<SearchHit> {
    let wanted = normalize_tags(tags);
    if wanted.is_empty() {
        return hits;
    }
    hits.into_iter()
        .filter(|h| h.document.metadata.has_any_tag(&wanted))
        .collect()
}

/// Run a chunk search, then apply the tag filter
pub async fn search_chunks(
    index: &VectorIndex,
    embedder: &dyn Embedder,
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchHit>> {
    let hits = match options.mode {
        SearchMode::Similarity => {
            index
                .similarity_search(embedder, query, options.limit)
                .await?
        }
        SearchMode::Mmr { fetch_k, lambda } => {
            index
                .max_marginal_relevance_search(embedder, query, options.limit, fetch_k, lambda)
                .await?
        }
    };
    Ok(filter_by_tags(hits, &options.tags))
}
