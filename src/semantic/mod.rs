//! Semantic Index Client
//!
//! Embeds text and runs nearest-neighbour lookups against a vector index.
//! Search never raises: an unreachable or uninitialised index degrades to
//! an empty passage list plus a diagnostic.

use crate::error::OrchestrationError;
use crate::models::{Document, Metadata, Passage};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod memory;
pub mod openai;
pub mod pinecone;

pub use memory::{HashEmbedder, InMemoryVectorIndex};
pub use openai::OpenAiEmbedder;
pub use pinecone::PineconeIndex;

pub const DEFAULT_TOP_K: usize = 3;
const MAX_TOP_K: usize = 20;

/// Metadata key holding the passage text.
pub const TEXT_KEY: &str = "text";

/// Converts text into a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimensions(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// A ranked match returned by the vector index
#[derive(Debug, Clone)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// Storage and nearest-neighbour lookup over embedded documents
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, id: &str, vector: Vec<f32>, metadata: Metadata) -> Result<()>;

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>>;
}

/// Passages plus the reason they may be missing.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub passages: Vec<Passage>,
    pub diagnostic: Option<String>,
}

impl SearchOutcome {
    fn degraded(diagnostic: String) -> Self {
        Self {
            passages: Vec::new(),
            diagnostic: Some(diagnostic),
        }
    }
}

pub struct SemanticIndexClient {
    embedder: Arc<dyn Embedder>,
    index: Option<Arc<dyn VectorIndex>>,
}

impl SemanticIndexClient {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index: Some(index),
        }
    }

    /// Client with no vector index behind it. Searches degrade, ingestion fails.
    pub fn uninitialized(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            index: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.index.is_some()
    }

    /// Top-`k` passages by descending relevance. Never fails.
    pub async fn search(&self, query: &str, k: usize) -> SearchOutcome {
        if k == 0 {
            return SearchOutcome {
                passages: Vec::new(),
                diagnostic: None,
            };
        }

        let Some(index) = &self.index else {
            warn!("Vector search skipped: index not initialized");
            return SearchOutcome::degraded("Vector database not initialized".to_string());
        };

        let k = k.min(MAX_TOP_K);

        let vector = match self.embedder.embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "Vector search failed while embedding query");
                return SearchOutcome::degraded(format!("Unable to embed query: {}", e));
            }
        };

        let matches = match index.query(&vector, k).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "Vector search failed");
                return SearchOutcome::degraded(format!("Unable to search knowledge base: {}", e));
            }
        };

        let mut passages: Vec<Passage> = matches
            .into_iter()
            .filter_map(into_passage)
            .collect();

        passages.sort_by(|a, b| b.score.total_cmp(&a.score));
        passages.truncate(k);

        debug!(k, passages = passages.len(), "Vector search complete");

        SearchOutcome {
            passages,
            diagnostic: None,
        }
    }

    /// Embed and store a document, returning its identifier.
    pub async fn index(&self, document: Document) -> Result<String> {
        if document.text.trim().is_empty() {
            return Err(OrchestrationError::InvalidInput("Text is required".to_string()));
        }

        let index = self.index.as_ref().ok_or_else(|| {
            OrchestrationError::IndexUnavailable("Vector database not initialized".to_string())
        })?;

        let vector = self.embedder.embed(&document.text).await.map_err(|e| match e {
            OrchestrationError::EmbeddingError(_) => e,
            other => OrchestrationError::EmbeddingError(other.to_string()),
        })?;

        let id = match document.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("doc_{}", uuid::Uuid::new_v4()),
        };

        let mut metadata = document.metadata;
        metadata.insert(TEXT_KEY.to_string(), Value::String(document.text));

        index.upsert(&id, vector, metadata).await.map_err(|e| match e {
            OrchestrationError::IndexUnavailable(_) => e,
            other => OrchestrationError::IndexUnavailable(other.to_string()),
        })?;

        debug!(document_id = %id, "Document indexed");

        Ok(id)
    }
}

fn into_passage(m: IndexMatch) -> Option<Passage> {
    let text = m.metadata.get(TEXT_KEY)?.as_str()?.to_string();
    Some(Passage {
        document_id: m.id,
        text,
        score: m.score,
        metadata: m.metadata,
    })
}
