//! Build-time ingestion: chunk → embed → upsert.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::chunking::SentenceChunker;
use crate::config::RagConfig;
use crate::document::{DocumentChunk, EmbeddingVector};
use crate::embedding::{BatchEmbedder, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// Indexes source documents into the vector store.
///
/// Text is chunked with the configured sizes, embedded in rate-limited
/// batches, and upserted under ids derived from `(source, chunk_index)`, so
/// running the same source through the pipeline twice replaces its entries
/// instead of duplicating them.
pub struct IngestPipeline {
    chunker: SentenceChunker,
    embedder: BatchEmbedder,
    index: Arc<dyn VectorIndex>,
    namespace: String,
}

impl IngestPipeline {
    /// Build a pipeline from a config and injected provider/index clients.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: &RagConfig,
    ) -> Self {
        Self {
            chunker: SentenceChunker::new(config.chunk_size, config.chunk_overlap),
            embedder: BatchEmbedder::new(
                provider,
                config.batch_size,
                Duration::from_millis(config.batch_delay_ms),
            ),
            index,
            namespace: config.namespace.clone(),
        }
    }

    /// Ingest one source document: chunk, embed, and upsert its vectors.
    ///
    /// Returns the chunks that were indexed. Empty input indexes nothing and
    /// returns an empty `Vec`.
    ///
    /// # Errors
    ///
    /// Propagates embedding and index failures with their stage labels.
    pub async fn ingest(&self, text: &str, source: &str) -> Result<Vec<DocumentChunk>> {
        let chunks = self.chunker.chunk(text, source);
        if chunks.is_empty() {
            info!(source, chunk_count = 0, "ingested document (empty)");
            return Ok(chunks);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_all(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingError {
                provider: "batch".into(),
                message: format!(
                    "got {} embeddings for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }

        let vectors: Vec<EmbeddingVector> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, values)| EmbeddingVector::from_chunk(chunk, values))
            .collect();

        self.index.upsert(&self.namespace, &vectors).await?;

        info!(source, chunk_count = chunks.len(), namespace = %self.namespace, "ingested document");
        Ok(chunks)
    }

    /// Drop every vector in the pipeline's namespace, then ingest `text`.
    ///
    /// Used when a source shrank between versions and stale trailing chunks
    /// must not survive the id-overwrite of a plain re-ingest.
    pub async fn reindex(&self, text: &str, source: &str) -> Result<Vec<DocumentChunk>> {
        self.index.delete_namespace(&self.namespace).await?;
        self.ingest(text, source).await
    }
}
