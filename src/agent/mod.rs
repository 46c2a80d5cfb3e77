//! Hybrid retrieval orchestrator
//!
//! ROUTE → (FETCH domains ∥ SEARCH passages) → JOIN → FUSE → COMPOSE
//!
//! Domain fetches and the semantic search run concurrently inside the
//! caller's task and are joined before fusion. Dropping the returned
//! future abandons every pending fetch; nothing is fused from a partial join.

use crate::classifier::TopicRouter;
use crate::composer::AnswerComposer;
use crate::fusion::ResultFuser;
use crate::gateway::{DataGateway, FetchFilter};
use crate::models::{Answer, Document, Domain, GroundingContext, Passage, RecordSet};
use crate::semantic::{SemanticIndexClient, DEFAULT_TOP_K};
use crate::Result;
use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, info, warn};

pub mod runtime;
pub use runtime::Runtime;

/// Everything gathered for one query before generation.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub domains: Vec<Domain>,
    pub record_sets: Vec<RecordSet>,
    pub passages: Vec<Passage>,
    pub context: GroundingContext,
    /// Reasons a source contributed nothing.
    pub diagnostics: Vec<String>,
}

pub struct HybridOrchestrator {
    gateway: DataGateway,
    semantic: SemanticIndexClient,
    composer: AnswerComposer,
    top_k: usize,
}

impl HybridOrchestrator {
    pub fn new(gateway: DataGateway, semantic: SemanticIndexClient, composer: AnswerComposer) -> Self {
        Self {
            gateway,
            semantic,
            composer,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Answer a free-text question grounded in structured and semantic data.
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        self.answer_with_filter(query, &FetchFilter::default()).await
    }

    /// Same as [`answer`](Self::answer), restricting structured fetches.
    pub async fn answer_with_filter(&self, query: &str, filter: &FetchFilter) -> Result<Answer> {
        self.answer_with_retrieval(query, filter).await.1
    }

    /// Answer and hand back the retrieval the answer was grounded on.
    ///
    /// The retrieval is returned even when generation fails, so callers can
    /// report degraded sources alongside the error.
    pub async fn answer_with_retrieval(
        &self,
        query: &str,
        filter: &FetchFilter,
    ) -> (Retrieval, Result<Answer>) {
        let start = Instant::now();
        let retrieval = self.retrieve_with_filter(query, filter).await;

        let text = match self.composer.compose(query, &retrieval.context).await {
            Ok(text) => text,
            Err(e) => return (retrieval, Err(e)),
        };

        info!(
            domains = ?retrieval.domains,
            passages = retrieval.passages.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query answered"
        );

        let answer = Answer {
            text,
            domains: retrieval.domains.clone(),
            passages: retrieval.passages.len(),
            context_fingerprint: retrieval.context.fingerprint(),
        };
        (retrieval, Ok(answer))
    }

    /// Route, fetch, search and fuse without calling the generative model.
    pub async fn retrieve(&self, query: &str) -> Retrieval {
        self.retrieve_with_filter(query, &FetchFilter::default()).await
    }

    pub async fn retrieve_with_filter(&self, query: &str, filter: &FetchFilter) -> Retrieval {
        let domains = TopicRouter::route(query);
        debug!(domains = ?domains, "Query routed");

        // join_all yields results in input order, not completion order
        let structured = join_all(domains.iter().map(|domain| self.fetch_or_empty(*domain, filter)));
        let semantic = self.semantic.search(query, self.top_k);

        let (fetched, outcome) = tokio::join!(structured, semantic);

        let mut diagnostics = Vec::new();
        let record_sets: Vec<RecordSet> = fetched
            .into_iter()
            .map(|(set, diagnostic)| {
                diagnostics.extend(diagnostic);
                set
            })
            .collect();
        diagnostics.extend(outcome.diagnostic);

        let context = ResultFuser::fuse(&record_sets, &outcome.passages);

        Retrieval {
            domains,
            record_sets,
            passages: outcome.passages,
            context,
            diagnostics,
        }
    }

    /// Index a document for out-of-band corpus growth.
    pub async fn ingest_document(&self, document: Document) -> Result<String> {
        let id = self.semantic.index(document).await?;
        info!(document_id = %id, "Document ingested");
        Ok(id)
    }

    async fn fetch_or_empty(&self, domain: Domain, filter: &FetchFilter) -> (RecordSet, Option<String>) {
        match self.gateway.fetch(domain, filter).await {
            Ok(set) => (set, None),
            Err(e) => {
                warn!(domain = %domain, error = %e, "Structured fetch degraded to zero rows");
                (RecordSet::empty(domain), Some(format!("{}: {}", domain, e)))
            }
        }
    }
}
