//! In-memory vector index using cosine similarity.
//!
//! Suitable for development and tests; the production deployment talks to a
//! hosted index through the same [`VectorIndex`] trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{EmbeddingVector, RetrievalMatch};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// An in-memory [`VectorIndex`] scoring by cosine similarity.
///
/// Namespaces are nested `HashMap`s: namespace → vector id → vector. All
/// operations are async-safe via `tokio::sync::RwLock`. Querying an unknown
/// namespace returns no matches rather than an error, matching hosted
/// indexes where namespaces exist implicitly.
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    namespaces: RwLock<HashMap<String, HashMap<String, EmbeddingVector>>>,
}

impl InMemoryVectorIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vectors stored in a namespace.
    pub async fn len(&self, namespace: &str) -> usize {
        self.namespaces.read().await.get(namespace).map_or(0, HashMap::len)
    }

    /// Whether a namespace holds no vectors.
    pub async fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace).await == 0
    }
}

/// Cosine similarity of two vectors; 0.0 when either has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, namespace: &str, vectors: &[EmbeddingVector]) -> Result<()> {
        if vectors.is_empty() {
            return Ok(());
        }
        for vector in vectors {
            if vector.values.is_empty() {
                return Err(RagError::VectorStoreError {
                    backend: "in-memory".to_string(),
                    message: format!("vector '{}' has no values", vector.id),
                });
            }
        }

        let mut namespaces = self.namespaces.write().await;
        let store = namespaces.entry(namespace.to_string()).or_default();
        for vector in vectors {
            store.insert(vector.id.clone(), vector.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalMatch>> {
        let namespaces = self.namespaces.read().await;
        let Some(store) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<RetrievalMatch> = store
            .values()
            .map(|vector| RetrievalMatch {
                score: cosine_similarity(&vector.values, embedding),
                metadata: serde_json::to_value(&vector.metadata).ok(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        namespaces.remove(namespace);
        Ok(())
    }
}
