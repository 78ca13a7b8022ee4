//! Knowledge-base setup: chunk a source text file, embed it, and upsert the
//! vectors into the configured Pinecone namespace.
//!
//! Run: `ingest --file data/ghanaian-law-guide.txt --source ghanaian-law-guide`
//! with `OPENAI_API_KEY`, `PINECONE_API_KEY`, and `PINECONE_INDEX_HOST` set.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use lex_rag::openai::OpenAIEmbeddingProvider;
use lex_rag::pinecone::PineconeIndex;
use lex_rag::{IngestPipeline, RagConfig};

#[derive(Parser, Debug)]
#[command(name = "ingest", about = "Index a source document into the vector store")]
struct Args {
    /// Path to the source text file.
    #[arg(long)]
    file: PathBuf,

    /// Source identifier stored with every chunk.
    #[arg(long)]
    source: String,

    /// Vector index namespace.
    #[arg(long, default_value = "default")]
    namespace: String,

    /// Maximum chunk size in characters.
    #[arg(long, default_value_t = 1000)]
    chunk_size: usize,

    /// Overlap between consecutive chunks in characters.
    #[arg(long, default_value_t = 200)]
    chunk_overlap: usize,

    /// Delete the namespace before ingesting.
    #[arg(long, default_value_t = false)]
    reindex: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    info!(file = %args.file.display(), chars = text.len(), "loaded source text");

    let config = RagConfig::builder()
        .chunk_size(args.chunk_size)
        .chunk_overlap(args.chunk_overlap)
        .namespace(&args.namespace)
        .build()?;

    let provider = Arc::new(OpenAIEmbeddingProvider::from_env()?);
    let index = Arc::new(PineconeIndex::from_env()?);
    let pipeline = IngestPipeline::new(provider, index, &config);

    let chunks = if args.reindex {
        pipeline.reindex(&text, &args.source).await?
    } else {
        pipeline.ingest(&text, &args.source).await?
    };

    info!(
        source = %args.source,
        namespace = %args.namespace,
        chunk_count = chunks.len(),
        "knowledge base setup complete"
    );
    Ok(())
}
