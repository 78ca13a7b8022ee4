//! Vector index trait for storing chunk embeddings and answering
//! nearest-neighbor queries.

use async_trait::async_trait;

use crate::document::{EmbeddingVector, RetrievalMatch};
use crate::error::Result;

/// A vector index partitioned by namespace.
///
/// The index is an external collaborator: this crate only depends on the
/// contract below, never on how similarity search is implemented. Upsert is
/// idempotent per vector id, so re-ingesting a source overwrites its entries
/// instead of duplicating them.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Upsert vectors into a namespace. Existing ids are overwritten.
    async fn upsert(&self, namespace: &str, vectors: &[EmbeddingVector]) -> Result<()>;

    /// Return the `top_k` nearest stored vectors to `embedding`, ordered by
    /// descending similarity score, with their stored metadata.
    async fn query(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalMatch>>;

    /// Delete every vector in a namespace. Used for wholesale reindexing.
    async fn delete_namespace(&self, namespace: &str) -> Result<()>;
}
