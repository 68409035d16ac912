//! Vector index over review chunks
//!
//! Vectors are kept in memory and compared by cosine similarity. On disk an
//! index is a directory with `vectors.bin` (little-endian f32 rows) and
//! `docstore.json` (chunk ids, texts, metadata).

use super::ann::AnnIndex;
use super::documents::ChunkDocument;
use crate::error::{Result, VibeError};
use crate::llm::Embedder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BATCH_SIZE: usize = 32;
const VECTORS_FILE: &str = "vectors.bin";
const DOCSTORE_FILE: &str = "docstore.json";
const FORMAT_VERSION: u32 = 1;

/// A chunk returned by a search, with its cosine similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub document: ChunkDocument,
    pub score: f32,
}

/// Build progress
#[derive(Debug, Clone, Copy)]
pub struct BuildProgress {
    pub embedded: usize,
    pub total: usize,
}

#[derive(Serialize, Deserialize)]
struct Docstore {
    version: u32,
    model: String,
    dimensions: usize,
    created_at: DateTime<Utc>,
    documents: Vec<ChunkDocument>,
}

/// In-memory vector index with chunk metadata
pub struct VectorIndex {
    model: String,
    dimensions: usize,
    created_at: DateTime<Utc>,
    documents: Vec<ChunkDocument>,
    vectors: Vec<Vec<f32>>,
    ann: Option<AnnIndex>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("created_at", &self.created_at)
            .field("documents", &self.documents.len())
            .field("vectors", &self.vectors.len())
            .field("ann", &self.ann.is_some())
            .finish()
    }
}

impl VectorIndex {
    /// Empty index for a model
    pub fn empty(model: &str) -> Self {
        Self {
            model: model.to_string(),
            dimensions: 0,
            created_at: Utc::now(),
            documents: Vec::new(),
            vectors: Vec::new(),
            ann: None,
        }
    }

    /// Assemble an index from precomputed vectors
    pub fn from_parts(
        model: &str,
        documents: Vec<ChunkDocument>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if documents.len() != vectors.len() {
            return Err(VibeError::Index(format!(
                "{} documents but {} vectors",
                documents.len(),
                vectors.len()
            )));
        }
        for doc in &documents {
            validate_metadata(doc)?;
        }
        let dimensions = vectors.first().map(|v| v.len()).unwrap_or(0);
        if let Some(bad) = vectors.iter().position(|v| v.len() != dimensions) {
            return Err(VibeError::Index(format!(
                "vector for '{}' has {} dimensions, expected {}",
                documents[bad].id,
                vectors[bad].len(),
                dimensions
            )));
        }

        let ann = AnnIndex::build(&vectors);
        Ok(Self {
            model: model.to_string(),
            dimensions,
            created_at: Utc::now(),
            documents,
            vectors,
            ann,
        })
    }

    /// Embed every chunk and build the index. Any embedding failure aborts
    /// the whole build.
    pub async fn build(
        documents: Vec<ChunkDocument>,
        embedder: &dyn Embedder,
        progress: Option<&(dyn Fn(BuildProgress) + Send + Sync)>,
    ) -> Result<Self> {
        for doc in &documents {
            validate_metadata(doc)?;
        }

        let total = documents.len();
        let mut vectors = Vec::with_capacity(total);

        for batch in documents.chunks(BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
            let embeddings = embedder.embed_batch(&texts).await?;
            if embeddings.len() != texts.len() {
                return Err(VibeError::Index(format!(
                    "embedder returned {} vectors for {} chunks",
                    embeddings.len(),
                    texts.len()
                )));
            }
            vectors.extend(embeddings);

            if let Some(report) = progress {
                report(BuildProgress {
                    embedded: vectors.len(),
                    total,
                });
            }
        }

        tracing::info!("Embedded {} chunks with {}", total, embedder.model_name());
        Self::from_parts(embedder.model_name(), documents, vectors)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn documents(&self) -> &[ChunkDocument] {
        &self.documents
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Rows ranked by similarity to `query`, best first; ties keep insertion order
    fn rank(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if k == 0 || self.vectors.is_empty() {
            return Vec::new();
        }
        if !self.dimensions_match(query) {
            tracing::warn!(
                "Query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            );
            return Vec::new();
        }

        let mut ranked: Vec<(usize, f32)> = match self.ann {
            Some(ref ann) => ann
                .search(query, k.max(64))
                .into_iter()
                .map(|(row, _)| (row, cosine_similarity(query, &self.vectors[row])))
                .collect(),
            None => self
                .vectors
                .iter()
                .enumerate()
                .map(|(row, v)| (row, cosine_similarity(query, v)))
                .collect(),
        };

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(k);
        ranked
    }

    fn dimensions_match(&self, query: &[f32]) -> bool {
        query.len() == self.dimensions
    }

    /// Embed a query, refusing vectors the index cannot be compared with
    async fn embed_query(&self, embedder: &dyn Embedder, query: &str) -> Result<Vec<f32>> {
        let query_vec = embedder.embed(query).await?;
        if !self.dimensions_match(&query_vec) {
            return Err(VibeError::Index(format!(
                "query has {} dimensions, index has {} (built with {}, queried with {})",
                query_vec.len(),
                self.dimensions,
                self.model,
                embedder.model_name()
            )));
        }
        Ok(query_vec)
    }

    fn hit(&self, row: usize, score: f32) -> SearchHit {
        SearchHit {
            document: self.documents[row].clone(),
            score,
        }
    }

    /// k nearest chunks to a query vector; a vector of the wrong length
    /// matches nothing
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        self.rank(query, k)
            .into_iter()
            .map(|(row, score)| self.hit(row, score))
            .collect()
    }

    /// Embed `query` and return the k nearest chunks
    pub async fn similarity_search(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.embed_query(embedder, query).await?;
        Ok(self.search_by_vector(&query_vec, k))
    }

    /// Maximal marginal relevance over a query vector.
    ///
    /// Takes the `fetch_k` nearest rows, then greedily picks `k` maximising
    /// `lambda * sim(query, d) - (1 - lambda) * max(sim(d, picked))`.
    pub fn mmr_by_vector(
        &self,
        query: &[f32],
        k: usize,
        fetch_k: usize,
        lambda: f32,
    ) -> Vec<SearchHit> {
        let candidates = self.rank(query, fetch_k.max(k));
        let mut remaining: Vec<(usize, f32)> = candidates;
        let mut picked: Vec<(usize, f32)> = Vec::with_capacity(k);

        while picked.len() < k && !remaining.is_empty() {
            let mut best_pos = 0;
            let mut best_score = f32::NEG_INFINITY;

            for (pos, &(row, relevance)) in remaining.iter().enumerate() {
                let redundancy = picked
                    .iter()
                    .map(|&(p, _)| cosine_similarity(&self.vectors[row], &self.vectors[p]))
                    .fold(f32::NEG_INFINITY, f32::max);
                let redundancy = if picked.is_empty() { 0.0 } else { redundancy };
                let score = lambda * relevance - (1.0 - lambda) * redundancy;
                if score > best_score {
                    best_score = score;
                    best_pos = pos;
                }
            }

            picked.push(remaining.remove(best_pos));
        }

        picked
            .into_iter()
            .map(|(row, score)| self.hit(row, score))
            .collect()
    }

    /// Embed `query` and run an MMR search
    pub async fn max_marginal_relevance_search(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        k: usize,
        fetch_k: usize,
        lambda: f32,
    ) -> Result<Vec<SearchHit>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.embed_query(embedder, query).await?;
        Ok(self.mmr_by_vector(&query_vec, k, fetch_k, lambda))
    }

    /// Write the index into `dir`, replacing any previous bundle
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let bytes: Vec<u8> = self
            .vectors
            .iter()
            .flat_map(|v| embedding_to_bytes(v))
            .collect();
        std::fs::write(dir.join(VECTORS_FILE), bytes)?;

        let docstore = Docstore {
            version: FORMAT_VERSION,
            model: self.model.clone(),
            dimensions: self.dimensions,
            created_at: self.created_at,
            documents: self.documents.clone(),
        };
        std::fs::write(
            dir.join(DOCSTORE_FILE),
            serde_json::to_string_pretty(&docstore)?,
        )?;

        tracing::info!(
            "Vector index saved at {} ({} chunks)",
            dir.display(),
            self.len()
        );
        Ok(())
    }

    /// Load an index written by [`VectorIndex::save`]
    pub fn load(dir: &Path) -> Result<Self> {
        let docstore_path = dir.join(DOCSTORE_FILE);
        if !docstore_path.exists() {
            return Err(VibeError::DataNotFound(format!(
                "no vector index at {} (run `vibenav index` first)",
                dir.display()
            )));
        }

        let docstore: Docstore = serde_json::from_str(&std::fs::read_to_string(&docstore_path)?)?;
        if docstore.version != FORMAT_VERSION {
            return Err(VibeError::Index(format!(
                "unsupported index format version {}",
                docstore.version
            )));
        }

        let bytes = std::fs::read(dir.join(VECTORS_FILE))?;
        let expected = docstore.documents.len() * docstore.dimensions * 4;
        if bytes.len() != expected {
            return Err(VibeError::Index(format!(
                "{} is {} bytes, expected {} ({} rows x {} dims)",
                VECTORS_FILE,
                bytes.len(),
                expected,
                docstore.documents.len(),
                docstore.dimensions
            )));
        }

        let vectors: Vec<Vec<f32>> = if docstore.dimensions == 0 {
            vec![Vec::new(); docstore.documents.len()]
        } else {
            bytes
                .chunks_exact(docstore.dimensions * 4)
                .map(bytes_to_embedding)
                .collect()
        };

        let mut index = Self::from_parts(&docstore.model, docstore.documents, vectors)?;
        index.dimensions = docstore.dimensions;
        index.created_at = docstore.created_at;

        tracing::info!("Loaded vector index with {} embeddings", index.len());
        Ok(index)
    }
}

/// Chunks missing the fields the router and prompt builder consume are a
/// classifier bug; refuse to index them.
fn validate_metadata(doc: &ChunkDocument) -> Result<()> {
    if doc.metadata.source.trim().is_empty() {
        return Err(VibeError::Index(format!("chunk '{}' has no source", doc.id)));
    }
    if doc.metadata.place_id.is_empty() {
        return Err(VibeError::Index(format!("chunk '{}' has no place id", doc.id)));
    }
    if doc.metadata.url.trim().is_empty() {
        return Err(VibeError::Index(format!("chunk '{}' has no url", doc.id)));
    }
    Ok(())
}

/// Convert f32 embedding to bytes (little-endian)
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes to f32 embedding
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
