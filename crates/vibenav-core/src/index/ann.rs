//! HNSW approximate nearest neighbor graph over index rows

use super::store::cosine_similarity;
use instant_distance::{Builder, HnswMap, Search};

/// Minimum row count to justify building an HNSW graph.
/// Below this threshold, brute-force is fast enough.
pub const ANN_THRESHOLD: usize = 1000;

/// Fixed seed so a reloaded index rebuilds the same layer assignment
const ANN_SEED: u64 = 0x5eed_0f_7a95;

/// Wrapper for f32 vectors implementing instant_distance::Point
#[derive(Clone)]
struct EmbeddingPoint {
    values: Vec<f32>,
}

impl instant_distance::Point for EmbeddingPoint {
    fn distance(&self, other: &Self) -> f32 {
        // Cosine distance = 1.0 - cosine_similarity
        1.0 - cosine_similarity(&self.values, &other.values)
    }
}

/// HNSW graph mapping vectors to their row number in the index
pub struct AnnIndex {
    map: HnswMap<EmbeddingPoint, usize>,
    len: usize,
}

impl AnnIndex {
    /// Build a graph, or `None` when there are too few rows to bother
    pub fn build(vectors: &[Vec<f32>]) -> Option<Self> {
        let count = vectors.len();
        if count < ANN_THRESHOLD {
            tracing::debug!(
                "Skipping ANN index build: {} embeddings < {} threshold",
                count,
                ANN_THRESHOLD
            );
            return None;
        }

        let points: Vec<EmbeddingPoint> = vectors
            .iter()
            .map(|v| EmbeddingPoint { values: v.clone() })
            .collect();
        let rows: Vec<usize> = (0..count).collect();

        let map = Builder::default().seed(ANN_SEED).build(points, rows);
        tracing::info!("Built ANN index with {} embeddings", count);
        Some(Self { map, len: count })
    }

    /// Up to `k` nearest rows as (row, cosine similarity)
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let query_point = EmbeddingPoint {
            values: query.to_vec(),
        };
        let mut search = Search::default();

        self.map
            .search(&query_point, &mut search)
            .take(k)
            .map(|item| (*item.value, 1.0 - item.distance))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
