//! Offline semantic backends
//!
//! `HashEmbedder` hashes tokens into a fixed-size vector so the service
//! stays usable without an embedding API. `InMemoryVectorIndex` is a
//! brute-force cosine index, fast enough for a few thousand passages.

use super::{Embedder, IndexMatch, VectorIndex};
use crate::error::OrchestrationError;
use crate::models::Metadata;
use crate::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Deterministic token-hashing embedder
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.clamp(8, 4096),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(bytes) % self.dimensions as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];

        let tokens = text
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        for token in tokens {
            let idx = self.bucket(&token);
            vector[idx] += 1.0;
        }

        // L2 normalize to keep scores in [-1, 1]
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "local/token-hash"
    }
}

struct Entry {
    id: String,
    vector: Vec<f32>,
    metadata: Metadata,
}

/// Brute-force cosine similarity index
#[derive(Default)]
pub struct InMemoryVectorIndex {
    entries: Arc<RwLock<Vec<Entry>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, id: &str, vector: Vec<f32>, metadata: Metadata) -> Result<()> {
        let mut entries = self.entries.write().await;

        if let Some(first) = entries.first() {
            if first.vector.len() != vector.len() {
                return Err(OrchestrationError::IndexUnavailable(format!(
                    "dimension mismatch: index holds {}, got {}",
                    first.vector.len(),
                    vector.len()
                )));
            }
        }

        match entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => {
                existing.vector = vector;
                existing.metadata = metadata;
            }
            None => entries.push(Entry {
                id: id.to_string(),
                vector,
                metadata,
            }),
        }

        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>> {
        let entries = self.entries.read().await;

        let mut scored: Vec<(f32, &Entry)> = entries
            .iter()
            .filter(|e| e.vector.len() == vector.len())
            .map(|e| (cosine_sim(vector, &e.vector), e))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, e)| IndexMatch {
                id: e.id.clone(),
                score,
                metadata: e.metadata.clone(),
            })
            .collect())
    }
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("How do refunds work?").await.unwrap();
        let b = embedder.embed("how do REFUNDS work").await.unwrap();

        assert_eq!(a.len(), 64);
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_hash_embedder_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("   ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_query_ranks_by_cosine() {
        let index = InMemoryVectorIndex::new();
        index.upsert("a", vec![1.0, 0.0], Metadata::new()).await.unwrap();
        index.upsert("b", vec![0.0, 1.0], Metadata::new()).await.unwrap();
        index.upsert("c", vec![0.7, 0.7], Metadata::new()).await.unwrap();

        let matches = index.query(&[1.0, 0.1], 2).await.unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let index = InMemoryVectorIndex::new();
        index.upsert("a", vec![1.0, 0.0], Metadata::new()).await.unwrap();

        let result = index.upsert("b", vec![1.0, 0.0, 0.0], Metadata::new()).await;
        assert!(matches!(result, Err(OrchestrationError::IndexUnavailable(_))));
        assert_eq!(index.len().await, 1);
    }
}
