//! Batch embedding behavior: order alignment, partial-failure retry, and
//! terminal failure semantics.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use lex_rag::{BatchEmbedder, EmbeddingProvider, RagError};

/// Embeds `"text-N"` as `[N]`, so output alignment is directly observable.
/// Batch calls fail whenever the batch holds more than one text, forcing the
/// individual-retry path; single-item calls succeed unless the text is
/// listed in `poison`.
struct FlakyProvider {
    poison: Vec<String>,
    batch_calls: AtomicUsize,
    single_calls: AtomicUsize,
}

impl FlakyProvider {
    fn new(poison: Vec<String>) -> Self {
        Self { poison, batch_calls: AtomicUsize::new(0), single_calls: AtomicUsize::new(0) }
    }

    fn value_of(text: &str) -> f32 {
        text.rsplit('-').next().and_then(|n| n.parse().ok()).unwrap_or(-1.0)
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyProvider {
    async fn embed(&self, text: &str) -> lex_rag::Result<Vec<f32>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        if self.poison.iter().any(|p| p == text) {
            return Err(RagError::EmbeddingError {
                provider: "flaky".into(),
                message: format!("refused to embed '{text}'"),
            });
        }
        Ok(vec![Self::value_of(text)])
    }

    async fn embed_batch(&self, texts: &[&str]) -> lex_rag::Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if texts.len() > 1 {
            return Err(RagError::EmbeddingError {
                provider: "flaky".into(),
                message: "batch too large".into(),
            });
        }
        Ok(texts.iter().map(|t| vec![Self::value_of(t)]).collect())
    }

    fn dimensions(&self) -> usize {
        1
    }
}

/// A provider whose batch endpoint always works.
struct SteadyProvider;

#[async_trait]
impl EmbeddingProvider for SteadyProvider {
    async fn embed(&self, text: &str) -> lex_rag::Result<Vec<f32>> {
        Ok(vec![FlakyProvider::value_of(text)])
    }

    fn dimensions(&self) -> usize {
        1
    }
}

fn texts(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("text-{i}")).collect()
}

#[tokio::test]
async fn output_order_matches_input_order() {
    let provider = Arc::new(SteadyProvider);
    let embedder = BatchEmbedder::new(provider, 3, Duration::ZERO);

    let embeddings = embedder.embed_all(&texts(10)).await.unwrap();
    assert_eq!(embeddings.len(), 10);
    for (i, embedding) in embeddings.iter().enumerate() {
        assert_eq!(embedding, &vec![i as f32]);
    }
}

#[tokio::test]
async fn failed_batches_are_retried_individually_in_order() {
    let provider = Arc::new(FlakyProvider::new(Vec::new()));
    let embedder = BatchEmbedder::new(provider.clone(), 4, Duration::ZERO);

    let embeddings = embedder.embed_all(&texts(10)).await.unwrap();

    // Alignment holds even though every multi-item batch went through the
    // individual-retry path.
    assert_eq!(embeddings.len(), 10);
    for (i, embedding) in embeddings.iter().enumerate() {
        assert_eq!(embedding, &vec![i as f32], "misaligned at index {i}");
    }

    // Batches of 4, 4, 2 all failed; each text was then embedded singly.
    assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 3);
    assert_eq!(provider.single_calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn individual_retry_failure_is_terminal() {
    let provider = Arc::new(FlakyProvider::new(vec!["text-5".to_string()]));
    let embedder = BatchEmbedder::new(provider, 4, Duration::ZERO);

    let err = embedder.embed_all(&texts(8)).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { .. }));
}

#[tokio::test]
async fn empty_input_embeds_nothing() {
    let provider = Arc::new(FlakyProvider::new(Vec::new()));
    let embedder = BatchEmbedder::new(provider.clone(), 4, Duration::ZERO);

    let embeddings = embedder.embed_all(&[]).await.unwrap();
    assert!(embeddings.is_empty());
    assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_batch_size_is_treated_as_one() {
    let provider = Arc::new(SteadyProvider);
    let embedder = BatchEmbedder::new(provider, 0, Duration::ZERO);

    let embeddings = embedder.embed_all(&texts(3)).await.unwrap();
    assert_eq!(embeddings.len(), 3);
    for (i, embedding) in embeddings.iter().enumerate() {
        assert_eq!(embedding, &vec![i as f32]);
    }
}

#[tokio::test]
async fn single_item_batches_do_not_need_retry() {
    let provider = Arc::new(FlakyProvider::new(Vec::new()));
    let embedder = BatchEmbedder::new(provider.clone(), 1, Duration::ZERO);

    let embeddings = embedder.embed_all(&texts(3)).await.unwrap();
    assert_eq!(embeddings.len(), 3);
    assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 3);
    assert_eq!(provider.single_calls.load(Ordering::SeqCst), 0);
}
