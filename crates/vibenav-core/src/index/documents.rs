//! Turning places into metadata-carrying chunk documents

use super::chunker::chunk_text;
use crate::config::ChunkingConfig;
use crate::places::{Coordinates, Place, ReviewSource};
use serde::{Deserialize, Serialize};

/// Metadata copied from the parent place onto every chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Synthetic id of the owning place
    pub place_id: String,
    /// Display name of the owning place
    pub source: String,
    pub city: String,
    pub tags: Vec<String>,
    pub author: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews_count: Option<u64>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub review_source: ReviewSource,
    pub url: String,
}

impl ChunkMetadata {
    /// True when any of this chunk's tags is in `wanted` (already normalised)
    pub fn has_any_tag(&self, wanted: &[String]) -> bool {
        self.tags
            .iter()
            .any(|t| wanted.contains(&t.trim().to_lowercase()))
    }
}

/// A chunk of review text ready for embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkDocument {
    /// `<place_id>:<review#>:<chunk#>`
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Chunk every review of one place
pub fn chunk_place(place: &Place, chunking: &ChunkingConfig) -> Vec<ChunkDocument> {
    let mut docs = Vec::new();

    for (review_idx, review) in place.reviews().into_iter().enumerate() {
        let pieces = chunk_text(&review.text, chunking.chunk_size, chunking.chunk_overlap);
        for (chunk_idx, text) in pieces.into_iter().enumerate() {
            docs.push(ChunkDocument {
                id: format!("{}:{}:{}", place.id, review_idx, chunk_idx),
                text,
                metadata: ChunkMetadata {
                    place_id: place.id.clone(),
                    source: place.name.clone(),
                    city: place.city_or_unknown().to_string(),
                    tags: place.tags.clone(),
                    author: review.author.clone(),
                    address: place.address.clone(),
                    rating: place.rating,
                    reviews_count: place.reviews_count,
                    coordinates: place.coordinates,
                    review_source: review.source,
                    url: review.url.clone(),
                },
            });
        }
    }

    docs
}

/// Chunk all places, in file order
pub fn chunk_places(places: &[Place], chunking: &ChunkingConfig) -> Vec<ChunkDocument> {
    places
        .iter()
        .flat_map(|p| chunk_place(p, chunking))
        .collect()
}
