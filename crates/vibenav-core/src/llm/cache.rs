//! Embedding caching to avoid re-embedding repeated queries

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

/// Cache entry with TTL
#[derive(Clone)]
struct CacheEntry {
    vector: Vec<f32>,
    expires_at: SystemTime,
}

/// In-memory embedding cache keyed by (model, text).
///
/// Chat completions are deliberately not cached: a retried prompt must reach
/// the provider again.
pub struct EmbeddingCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl EmbeddingCache {
    /// Create new cache with default TTL of 1 hour
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(3600))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get cached vector if present and not expired
    pub fn get(&self, model: &str, text: &str) -> Option<Vec<f32>> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(&cache_key(model, text))?;

        if SystemTime::now() < entry.expires_at {
            Some(entry.vector.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, model: &str, text: &str, vector: Vec<f32>) {
        let entry = CacheEntry {
            vector,
            expires_at: SystemTime::now() + self.ttl,
        };
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(cache_key(model, text), entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear expired entries, returning how many were dropped
    pub fn cleanup(&self) -> usize {
        match self.entries.write() {
            Ok(mut entries) => {
                let before = entries.len();
                let now = SystemTime::now();
                entries.retain(|_, entry| now < entry.expires_at);
                before - entries.len()
            }
            Err(_) => 0,
        }
    }

    /// Clear expired entries once the cache holds at least `threshold`
    pub fn cleanup_above(&self, threshold: usize) -> usize {
        if self.len() < threshold {
            return 0;
        }
        self.cleanup()
    }

    pub fn stats(&self) -> CacheStats {
        if let Ok(entries) = self.entries.read() {
            let now = SystemTime::now();
            let total = entries.len();
            let expired = entries.values().filter(|e| now >= e.expires_at).count();

            CacheStats {
                total_entries: total,
                expired_entries: expired,
                active_entries: total - expired,
            }
        } else {
            CacheStats::default()
        }
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

fn cache_key(model: &str, text: &str) -> String {
    let digest = blake3::hash(text.as_bytes());
    format!("embed:{}:{}", model, digest.to_hex())
}
