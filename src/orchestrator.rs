//! Conversation orchestration: merge retrieved context with rolling dialogue
//! history into a bounded prompt and manage answer delivery.
//!
//! Each call is stateless; session persistence belongs to the calling layer,
//! which passes the recent history in by value.

use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chat::{ChatMessage, ChatModel, ChatRole, GenerationConfig};
use crate::error::{RagError, Result};
use crate::prompt::{HISTORY_WINDOW, SYSTEM_PROMPT, follow_up_prompt, user_prompt};
use crate::retriever::Retriever;

/// Fixed answer returned when retrieval yields nothing. The generation model
/// is never invoked in that case, so the assistant cannot answer without
/// grounding.
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find specific information about that in the \
     knowledge base. Could you rephrase your question or ask about a different topic related \
     to Ghanaian law?";

/// A retrieved chunk cited as grounding for an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceAttribution {
    /// The chunk text the answer drew on.
    pub content: String,
    /// Page number, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Similarity score of the chunk for this query.
    pub score: f32,
}

/// The outcome of one question-answering call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated (or fallback) answer.
    pub answer: String,
    /// Chunks the answer was grounded on, ordered by descending score.
    pub sources: Vec<SourceAttribution>,
    /// The generation model name.
    pub model: String,
    /// Total tokens consumed, when the provider reported usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

/// Orchestrates retrieve → prompt-build → generate for one conversation turn.
///
/// Construct via [`ChatOrchestrator::builder()`]; the retriever and model are
/// injected once at process start rather than created lazily inside.
pub struct ChatOrchestrator {
    retriever: Arc<Retriever>,
    model: Arc<dyn ChatModel>,
    generation: GenerationConfig,
}

impl std::fmt::Debug for ChatOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOrchestrator")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl ChatOrchestrator {
    /// Create a new [`ChatOrchestratorBuilder`].
    pub fn builder() -> ChatOrchestratorBuilder {
        ChatOrchestratorBuilder::default()
    }

    /// Answer a query in whole-response mode.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RetrievalError`] when retrieval fails and
    /// [`RagError::GenerationError`] when generation fails; neither is
    /// retried here.
    pub async fn answer(&self, query: &str, history: &[ChatMessage]) -> Result<ChatResponse> {
        let rag = self.retriever.retrieve(query).await?;

        if rag.is_empty() {
            info!(query, "no relevant context found, returning fallback");
            return Ok(self.no_context_response());
        }

        let messages = self.build_messages(query, &rag.context, history);
        let completion = self.model.generate(&messages, &self.generation).await?;
        let provider = self.model.name();
        info!(
            provider,
            model = %self.generation.model,
            tokens = ?completion.total_tokens,
            "generated answer"
        );

        Ok(ChatResponse {
            answer: completion.text,
            sources: sources_from(&rag.results),
            model: self.generation.model.clone(),
            tokens_used: completion.total_tokens,
        })
    }

    /// Answer a query in streamed mode, forwarding each fragment to
    /// `on_token` as soon as it is received.
    ///
    /// The returned `answer` is byte-identical to the concatenation of all
    /// forwarded fragments, and `sources` is identical to what
    /// [`answer`](Self::answer) would produce from the same retrieval.
    /// When retrieval finds nothing, the fallback answer is delivered through
    /// `on_token` once and the model is not invoked.
    pub async fn answer_streaming<F>(
        &self,
        query: &str,
        history: &[ChatMessage],
        mut on_token: F,
    ) -> Result<ChatResponse>
    where
        F: FnMut(&str) + Send,
    {
        let rag = self.retriever.retrieve(query).await?;

        if rag.is_empty() {
            info!(query, "no relevant context found, streaming fallback");
            on_token(NO_CONTEXT_ANSWER);
            return Ok(self.no_context_response());
        }

        let messages = self.build_messages(query, &rag.context, history);
        let mut stream = self.model.generate_stream(&messages, &self.generation).await?;

        let mut answer = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            on_token(&fragment);
            answer.push_str(&fragment);
        }
        let provider = self.model.name();
        info!(
            provider,
            model = %self.generation.model,
            chars = answer.len(),
            "streamed answer"
        );

        Ok(ChatResponse {
            answer,
            sources: sources_from(&rag.results),
            model: self.generation.model.clone(),
            tokens_used: None,
        })
    }

    /// Assemble the prompt: system message, recent dialogue turns, then the
    /// context-bearing user prompt.
    ///
    /// System messages in the incoming history are dropped; the remaining
    /// turns are windowed to the last [`HISTORY_WINDOW`] so prompts stay
    /// bounded over long sessions.
    fn build_messages(
        &self,
        query: &str,
        context: &str,
        history: &[ChatMessage],
    ) -> Vec<ChatMessage> {
        let dialogue: Vec<ChatMessage> =
            history.iter().filter(|m| m.role != ChatRole::System).cloned().collect();

        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];

        if dialogue.is_empty() {
            messages.push(ChatMessage::user(user_prompt(query, context)));
        } else {
            let start = dialogue.len().saturating_sub(HISTORY_WINDOW);
            messages.extend(dialogue[start..].iter().cloned());
            messages.push(ChatMessage::user(follow_up_prompt(query, context, &dialogue)));
        }

        messages
    }

    fn no_context_response(&self) -> ChatResponse {
        ChatResponse {
            answer: NO_CONTEXT_ANSWER.to_string(),
            sources: Vec::new(),
            model: self.generation.model.clone(),
            tokens_used: None,
        }
    }
}

fn sources_from(results: &[crate::document::RetrievalResult]) -> Vec<SourceAttribution> {
    results
        .iter()
        .map(|r| SourceAttribution {
            content: r.content.clone(),
            page_number: r.page_number,
            score: r.score,
        })
        .collect()
}

/// Builder for constructing a [`ChatOrchestrator`].
///
/// `retriever` and `model` are required; `generation` defaults to
/// [`GenerationConfig::default()`].
#[derive(Default)]
pub struct ChatOrchestratorBuilder {
    retriever: Option<Arc<Retriever>>,
    model: Option<Arc<dyn ChatModel>>,
    generation: Option<GenerationConfig>,
}

impl ChatOrchestratorBuilder {
    /// Set the retriever.
    pub fn retriever(mut self, retriever: Arc<Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Set the generation model.
    pub fn model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the generation configuration.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Build the [`ChatOrchestrator`], validating required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `retriever` or `model` is missing.
    pub fn build(self) -> Result<ChatOrchestrator> {
        let retriever = self
            .retriever
            .ok_or_else(|| RagError::ConfigError("retriever is required".to_string()))?;
        let model =
            self.model.ok_or_else(|| RagError::ConfigError("model is required".to_string()))?;

        Ok(ChatOrchestrator {
            retriever,
            model,
            generation: self.generation.unwrap_or_default(),
        })
    }
}
