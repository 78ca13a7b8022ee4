//! Retrieval filtering, ordering, metadata tolerance, and context assembly.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use lex_rag::{
    EmbeddingProvider, EmbeddingVector, RagConfig, RetrievalMatch, Retriever, VectorIndex,
    VectorMetadata,
};

/// Embeds every text as the same unit vector; scores are then controlled
/// entirely by what the index returns.
struct UnitEmbedder;

#[async_trait]
impl EmbeddingProvider for UnitEmbedder {
    async fn embed(&self, _text: &str) -> lex_rag::Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Returns a fixed list of matches regardless of the query vector.
struct StaticIndex {
    matches: Vec<RetrievalMatch>,
}

#[async_trait]
impl VectorIndex for StaticIndex {
    async fn upsert(&self, _namespace: &str, _vectors: &[EmbeddingVector]) -> lex_rag::Result<()> {
        Ok(())
    }

    async fn query(
        &self,
        _namespace: &str,
        _embedding: &[f32],
        top_k: usize,
    ) -> lex_rag::Result<Vec<RetrievalMatch>> {
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    async fn delete_namespace(&self, _namespace: &str) -> lex_rag::Result<()> {
        Ok(())
    }
}

fn match_with(score: f32, content: &str) -> RetrievalMatch {
    RetrievalMatch {
        score,
        metadata: Some(json!({
            "content": content,
            "source": "guide.pdf",
            "chunkIndex": 0,
        })),
    }
}

fn retriever(matches: Vec<RetrievalMatch>, threshold: f32) -> Retriever {
    let config = RagConfig::builder()
        .top_k(10)
        .similarity_threshold(threshold)
        .namespace("test")
        .build()
        .unwrap();
    Retriever::new(Arc::new(UnitEmbedder), Arc::new(StaticIndex { matches }), config)
}

#[tokio::test]
async fn drops_candidates_below_threshold_preserving_order() {
    // Index returns candidates in descending score order per its contract.
    let matches = vec![
        match_with(0.5, "best"),
        match_with(0.35, "good"),
        match_with(0.18, "weak"),
    ];
    let result = retriever(matches, 0.2).retrieve("query").await.unwrap();

    assert_eq!(result.results.len(), 2);
    assert_eq!(result.results[0].score, 0.5);
    assert_eq!(result.results[1].score, 0.35);
    assert_eq!(result.results[0].content, "best");
    assert_eq!(result.results[1].content, "good");
}

#[tokio::test]
async fn score_equal_to_threshold_survives() {
    let matches = vec![match_with(0.2, "borderline")];
    let result = retriever(matches, 0.2).retrieve("query").await.unwrap();
    assert_eq!(result.results.len(), 1);
}

#[tokio::test]
async fn zero_survivors_is_a_valid_outcome() {
    let matches = vec![match_with(0.1, "weak"), match_with(0.05, "weaker")];
    let result = retriever(matches, 0.2).retrieve("query").await.unwrap();

    assert!(result.is_empty());
    assert!(result.results.is_empty());
    assert_eq!(result.context, "");
    assert_eq!(result.query, "query");
}

#[tokio::test]
async fn tolerates_partially_populated_metadata() {
    let matches = vec![
        RetrievalMatch { score: 0.9, metadata: None },
        RetrievalMatch { score: 0.8, metadata: Some(json!({ "pageNumber": 7 })) },
    ];
    let result = retriever(matches, 0.0).retrieve("query").await.unwrap();

    assert_eq!(result.results.len(), 2);
    assert_eq!(result.results[0].content, "");
    assert_eq!(result.results[0].source, "unknown");
    assert_eq!(result.results[1].page_number, Some(7));
    assert_eq!(result.results[1].source, "unknown");
}

#[tokio::test]
async fn context_joins_results_with_separator_and_page_markers() {
    let matches = vec![
        RetrievalMatch {
            score: 0.9,
            metadata: Some(json!({
                "content": "Contract law requires consideration.",
                "source": "guide.pdf",
                "pageNumber": 12,
            })),
        },
        match_with(0.6, "Offer and acceptance form agreement."),
    ];
    let result = retriever(matches, 0.0).retrieve("query").await.unwrap();

    assert_eq!(
        result.context,
        "[Page 12]\nContract law requires consideration.\n\n---\n\n\
         \nOffer and acceptance form agreement."
    );
}

#[tokio::test]
async fn top_k_override_bounds_candidates() {
    let matches = vec![match_with(0.9, "a"), match_with(0.8, "b"), match_with(0.7, "c")];
    let result = retriever(matches, 0.0).retrieve_top_k("query", 2).await.unwrap();
    assert_eq!(result.results.len(), 2);
}

#[tokio::test]
async fn end_to_end_with_in_memory_index() {
    use lex_rag::InMemoryVectorIndex;

    let index = Arc::new(InMemoryVectorIndex::new());
    index
        .upsert(
            "test",
            &[EmbeddingVector {
                id: "guide.pdf-0".into(),
                values: vec![1.0, 0.0],
                metadata: VectorMetadata {
                    content: "Consideration must move from the promisee.".into(),
                    source: "guide.pdf".into(),
                    page_number: Some(3),
                    chunk_index: 0,
                },
            }],
        )
        .await
        .unwrap();

    let config = RagConfig::builder()
        .top_k(2)
        .similarity_threshold(0.2)
        .namespace("test")
        .build()
        .unwrap();
    let retriever = Retriever::new(Arc::new(UnitEmbedder), index, config);

    let result = retriever.retrieve("what is consideration?").await.unwrap();
    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].source, "guide.pdf");
    assert!(result.context.starts_with("[Page 3]\n"));
}
