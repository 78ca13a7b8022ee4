//! Data types for chunks, stored vectors, and retrieval results.

use serde::{Deserialize, Serialize};

/// A contiguous, bounded-length excerpt of a source document.
///
/// Chunks are the atomic retrieval unit. They are immutable once produced by
/// the chunker; identity is `(source, chunk_index)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    /// The chunk text.
    pub content: String,
    /// Identifier of the source document this chunk was cut from.
    pub source: String,
    /// Sequential position of this chunk within its source, starting at 0.
    pub chunk_index: usize,
    /// Page the chunk originates from, when the loader provided one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Offset of the first character in the normalized source text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_char: Option<usize>,
    /// Offset of the last character in the normalized source text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_char: Option<usize>,
}

impl DocumentChunk {
    /// The id under which this chunk's vector is stored in the index.
    ///
    /// Re-ingesting the same source produces the same ids, so upserts
    /// overwrite instead of duplicating.
    pub fn vector_id(&self) -> String {
        format!("{}-{}", self.source, self.chunk_index)
    }
}

/// Descriptive fields stored alongside a vector in the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VectorMetadata {
    /// The chunk text, stored so retrieval needs no second lookup.
    pub content: String,
    /// Source document identifier.
    pub source: String,
    /// Page number, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Position of the chunk within its source.
    pub chunk_index: usize,
}

/// A chunk embedding ready for the vector index.
///
/// Produced once per chunk and never mutated; reindexing replaces the entry
/// wholesale via idempotent upsert on `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingVector {
    /// Index id, `"<source>-<chunk_index>"`.
    pub id: String,
    /// The embedding values. Length is fixed by the embedding model.
    pub values: Vec<f32>,
    /// A copy of the chunk's descriptive fields.
    pub metadata: VectorMetadata,
}

impl EmbeddingVector {
    /// Pair a chunk with its embedding values.
    pub fn from_chunk(chunk: &DocumentChunk, values: Vec<f32>) -> Self {
        Self {
            id: chunk.vector_id(),
            values,
            metadata: VectorMetadata {
                content: chunk.content.clone(),
                source: chunk.source.clone(),
                page_number: chunk.page_number,
                chunk_index: chunk.chunk_index,
            },
        }
    }
}

/// A raw nearest-neighbor candidate returned by the vector index.
///
/// Metadata is kept loosely typed: real indexes return whatever was stored,
/// and the retriever tolerates missing fields rather than failing the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalMatch {
    /// Similarity score; range depends on the index's distance metric.
    pub score: f32,
    /// Stored metadata, possibly absent or partially populated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// A retrieval candidate that survived threshold filtering, with metadata
/// defaults applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    /// The chunk text; empty string when the index entry carried none.
    pub content: String,
    /// Similarity score from the index.
    pub score: f32,
    /// Source document identifier, or `"unknown"` when missing.
    pub source: String,
    /// Page number, when stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Position of the chunk within its source; 0 when missing.
    pub chunk_index: usize,
}

/// The outcome of a retrieval query: filtered results plus assembled context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagQueryResult {
    /// The query text as given by the caller.
    pub query: String,
    /// Surviving results, ordered by descending score.
    pub results: Vec<RetrievalResult>,
    /// Concatenation of result contents, ready to ground a generation prompt.
    /// Empty when `results` is empty.
    pub context: String,
}

impl RagQueryResult {
    /// Whether retrieval found nothing usable.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
