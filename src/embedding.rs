//! Embedding provider trait and rate-limited batch embedding.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends with native batch endpoints should override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// Output order must match input order exactly.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// Batched embedding with partial-failure recovery.
///
/// Partitions inputs into consecutive batches and embeds them one after
/// another with a deliberate delay in between, respecting provider rate
/// limits. A failed batch does not fail the whole operation: its texts are
/// retried individually (with the same delay between calls) before giving up.
/// Output vectors are index-aligned with the input on every path.
pub struct BatchEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    delay: Duration,
}

impl BatchEmbedder {
    /// Create a new batch embedder.
    ///
    /// # Arguments
    ///
    /// * `batch_size` — number of texts per provider call; zero is treated
    ///   as one
    /// * `delay` — pause between batches and between individual retries
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize, delay: Duration) -> Self {
        Self { provider, batch_size: batch_size.max(1), delay }
    }

    /// Embed all `texts`, returning one vector per input in input order.
    ///
    /// # Errors
    ///
    /// Fails only when an individually retried call fails; a batch-level
    /// failure alone is recovered from.
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        let batches: Vec<&[String]> = texts.chunks(self.batch_size).collect();
        let total = batches.len();
        debug!(texts = texts.len(), batches = total, "embedding texts in batches");

        for (i, batch) in batches.iter().enumerate() {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            match self.provider.embed_batch(&refs).await {
                Ok(batch_embeddings) => {
                    debug!(batch = i + 1, total, size = refs.len(), "embedded batch");
                    embeddings.extend(batch_embeddings);
                    if i + 1 < total && !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                Err(e) => {
                    // Keep going: one oversized or throttled batch should not
                    // lose the whole ingest. Retry its texts one by one.
                    warn!(batch = i + 1, total, error = %e, "batch failed, retrying individually");
                    for text in refs {
                        embeddings.push(self.provider.embed(text).await?);
                        if !self.delay.is_zero() {
                            tokio::time::sleep(self.delay).await;
                        }
                    }
                }
            }
        }

        Ok(embeddings)
    }

    /// Return the dimensionality of the underlying provider.
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }
}
