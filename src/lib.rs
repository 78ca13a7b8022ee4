//! # lex-rag
//!
//! Retrieval-augmented question answering core for a fixed legal-document
//! knowledge base.
//!
//! The crate covers the retrieval pipeline end to end:
//!
//! - [`SentenceChunker`] — sentence-aligned chunking with overlap
//! - [`EmbeddingProvider`] / [`BatchEmbedder`] — embeddings with rate-limited
//!   batching and partial-failure retry
//! - [`VectorIndex`] — the nearest-neighbor index boundary
//!   ([`InMemoryVectorIndex`] for tests, [`PineconeIndex`](pinecone::PineconeIndex)
//!   for production)
//! - [`Retriever`] — embed → query → threshold-filter → context assembly
//! - [`ChatOrchestrator`] — prompt building over rolling history and streamed
//!   or whole-response answer delivery with cited sources
//! - [`IngestPipeline`] — build-time chunk → embed → upsert
//!
//! HTTP handling, session persistence, and document loading are external
//! collaborators; clients are injected once at construction rather than
//! created lazily inside the core.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lex_rag::{
//!     ChatOrchestrator, InMemoryVectorIndex, RagConfig, Retriever,
//!     openai::{OpenAIChatModel, OpenAIEmbeddingProvider},
//! };
//!
//! let config = RagConfig::builder().namespace("ghanaian-law").build()?;
//! let embedder = Arc::new(OpenAIEmbeddingProvider::from_env()?);
//! let index = Arc::new(InMemoryVectorIndex::new());
//! let retriever = Arc::new(Retriever::new(embedder, index, config));
//!
//! let orchestrator = ChatOrchestrator::builder()
//!     .retriever(retriever)
//!     .model(Arc::new(OpenAIChatModel::from_env()?))
//!     .build()?;
//!
//! let response = orchestrator.answer("What is consideration?", &[]).await?;
//! println!("{} ({} sources)", response.answer, response.sources.len());
//! ```

pub mod chat;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod openai;
pub mod orchestrator;
pub mod pinecone;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod vectorstore;

pub use chat::{ChatMessage, ChatModel, ChatRole, Completion, GenerationConfig, TokenStream};
pub use chunking::SentenceChunker;
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    DocumentChunk, EmbeddingVector, RagQueryResult, RetrievalMatch, RetrievalResult,
    VectorMetadata,
};
pub use embedding::{BatchEmbedder, EmbeddingProvider};
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorIndex;
pub use orchestrator::{
    ChatOrchestrator, ChatOrchestratorBuilder, ChatResponse, NO_CONTEXT_ANSWER, SourceAttribution,
};
pub use pipeline::IngestPipeline;
pub use retriever::Retriever;
pub use vectorstore::VectorIndex;
