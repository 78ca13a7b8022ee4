//! Pinecone vector index backend over the data-plane REST API.
//!
//! Talks directly to an index host (`https://<index>-<project>.svc.<env>.pinecone.io`)
//! with `reqwest`; no SDK dependency. Only the operations the retrieval core
//! needs are wrapped: upsert, query, and namespace deletion.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::{EmbeddingVector, RetrievalMatch};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// Pinecone caps upsert requests at 100 vectors; larger sets are sent in
/// consecutive requests.
const UPSERT_BATCH_SIZE: usize = 100;

/// A [`VectorIndex`] backed by a hosted Pinecone index.
///
/// # Configuration
///
/// - `host` – the index's data-plane URL, without a trailing slash.
/// - `api_key` – from the constructor or the `PINECONE_API_KEY` environment
///   variable (with `PINECONE_INDEX_HOST` for the host).
///
/// # Example
///
/// ```rust,ignore
/// use lex_rag::pinecone::PineconeIndex;
///
/// let index = PineconeIndex::new("https://law-bot-index-abc.svc.us-east-1.pinecone.io", "pc-...")?;
/// let matches = index.query("ghanaian-law", &query_embedding, 2).await?;
/// ```
pub struct PineconeIndex {
    client: reqwest::Client,
    host: String,
    api_key: String,
}

impl PineconeIndex {
    /// Create a new client for the given index host.
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let host = host.into().trim_end_matches('/').to_string();
        let api_key = api_key.into();
        if host.is_empty() {
            return Err(RagError::ConfigError("Pinecone index host must not be empty".into()));
        }
        if api_key.is_empty() {
            return Err(RagError::ConfigError("Pinecone API key must not be empty".into()));
        }
        Ok(Self { client: reqwest::Client::new(), host, api_key })
    }

    /// Create a client from `PINECONE_INDEX_HOST` and `PINECONE_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("PINECONE_INDEX_HOST").map_err(|_| {
            RagError::ConfigError("PINECONE_INDEX_HOST environment variable not set".into())
        })?;
        let api_key = std::env::var("PINECONE_API_KEY").map_err(|_| {
            RagError::ConfigError("PINECONE_API_KEY environment variable not set".into())
        })?;
        Self::new(host, api_key)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.host);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(backend = "pinecone", %url, error = %e, "request failed");
                RagError::VectorStoreError {
                    backend: "pinecone".into(),
                    message: format!("request to {path} failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(backend = "pinecone", %status, "API error");
            return Err(RagError::VectorStoreError {
                backend: "pinecone".into(),
                message: format!("API returned {status}: {body}"),
            });
        }

        Ok(response)
    }
}

// ── Pinecone API request/response types ────────────────────────────

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [EmbeddingVector],
    namespace: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    namespace: &'a str,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    delete_all: bool,
    namespace: &'a str,
}

// ── VectorIndex implementation ─────────────────────────────────────

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, namespace: &str, vectors: &[EmbeddingVector]) -> Result<()> {
        if vectors.is_empty() {
            return Ok(());
        }

        let batches: Vec<&[EmbeddingVector]> = vectors.chunks(UPSERT_BATCH_SIZE).collect();
        let total = batches.len();
        for (i, batch) in batches.into_iter().enumerate() {
            let request = UpsertRequest { vectors: batch, namespace };
            self.post("/vectors/upsert", &request).await?;
            debug!(backend = "pinecone", batch = i + 1, total, size = batch.len(), "upserted batch");
        }

        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalMatch>> {
        let request =
            QueryRequest { vector: embedding, top_k, namespace, include_metadata: true };
        let response = self.post("/query", &request).await?;

        let query_response: QueryResponse = response.json().await.map_err(|e| {
            error!(backend = "pinecone", error = %e, "failed to parse query response");
            RagError::VectorStoreError {
                backend: "pinecone".into(),
                message: format!("failed to parse query response: {e}"),
            }
        })?;

        debug!(backend = "pinecone", matches = query_response.matches.len(), "query completed");
        Ok(query_response
            .matches
            .into_iter()
            .map(|m| RetrievalMatch { score: m.score, metadata: m.metadata })
            .collect())
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        let request = DeleteRequest { delete_all: true, namespace };
        self.post("/vectors/delete", &request).await?;
        debug!(backend = "pinecone", namespace, "deleted namespace");
        Ok(())
    }
}
