//! Error types for the `lex-rag` crate.
//!
//! Every error carries the pipeline stage it originated from so that callers
//! (typically an HTTP layer) can map failures to user-facing messages without
//! inspecting provider-specific details.

use thiserror::Error;

/// Errors that can occur in the retrieval and generation pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error or a missing credential/endpoint.
    /// Fatal; never retried.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An embedding provider call failed.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector index operation failed.
    #[error("Vector index error ({backend}): {message}")]
    VectorStoreError {
        /// The vector index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The retrieval stage failed (query embedding or index query).
    ///
    /// Zero retrieved results is *not* an error; it is a valid outcome
    /// handled by the orchestrator's no-context path.
    #[error("Retrieval error: {0}")]
    RetrievalError(String),

    /// The generation model failed. Not retried inside the core.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
