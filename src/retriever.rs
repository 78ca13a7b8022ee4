//! Query-time retrieval: embed the query, search the index, filter by
//! similarity threshold, and assemble the grounding context.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RagConfig;
use crate::document::{RagQueryResult, RetrievalMatch, RetrievalResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// Separator between chunk contents in the assembled context.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Retrieves the most relevant chunks for a query and assembles them into a
/// bounded context string.
///
/// `top_k` bounds index query cost, the similarity threshold bounds
/// generation-time context noise; candidates are fetched with `top_k` first
/// and then filtered, preserving the index's score-descending order.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    config: RagConfig,
}

impl Retriever {
    /// Create a new retriever over the given embedding provider and index.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: RagConfig,
    ) -> Self {
        Self { embedder, index, config }
    }

    /// The configuration this retriever was built with.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Retrieve relevant chunks using the configured `top_k`.
    pub async fn retrieve(&self, query: &str) -> Result<RagQueryResult> {
        self.retrieve_top_k(query, self.config.top_k).await
    }

    /// Retrieve relevant chunks with an explicit `top_k` override.
    ///
    /// Zero surviving results is a valid outcome, not an error: callers must
    /// handle the empty-context case explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RetrievalError`] when query embedding or the index
    /// query fails.
    pub async fn retrieve_top_k(&self, query: &str, top_k: usize) -> Result<RagQueryResult> {
        debug!(query, top_k, "retrieving relevant chunks");

        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| RagError::RetrievalError(format!("query embedding failed: {e}")))?;

        let matches = self
            .index
            .query(&self.config.namespace, &query_embedding, top_k)
            .await
            .map_err(|e| RagError::RetrievalError(format!("index query failed: {e}")))?;

        let candidates = matches.len();
        let threshold = self.config.similarity_threshold;
        let results: Vec<RetrievalResult> = matches
            .into_iter()
            .filter(|m| m.score >= threshold)
            .map(to_retrieval_result)
            .collect();

        info!(
            candidates,
            surviving = results.len(),
            threshold,
            "retrieval completed"
        );

        let context = build_context(&results);
        Ok(RagQueryResult { query: query.to_string(), results, context })
    }
}

/// Map an index match to a result, defaulting fields the index entry lacks.
///
/// Real indexes can return partially-populated metadata; that is tolerated
/// here rather than failing the query.
fn to_retrieval_result(m: RetrievalMatch) -> RetrievalResult {
    let metadata = m.metadata.as_ref();
    let field = |name: &str| metadata.and_then(|v| v.get(name));

    RetrievalResult {
        content: field("content").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        score: m.score,
        source: field("source").and_then(|v| v.as_str()).unwrap_or("unknown").to_string(),
        page_number: field("pageNumber").and_then(|v| v.as_u64()).map(|n| n as u32),
        chunk_index: field("chunkIndex").and_then(|v| v.as_u64()).unwrap_or(0) as usize,
    }
}

/// Join result contents into a single context string, prefixing each with a
/// page marker when a page number is known.
pub fn build_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .map(|result| {
            let page_info = result
                .page_number
                .map(|n| format!("[Page {n}]"))
                .unwrap_or_default();
            format!("{page_info}\n{}", result.content)
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
