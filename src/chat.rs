//! Generation model seam: role-tagged messages, generation configuration,
//! and the [`ChatModel`] trait with blocking and streaming completion.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Who authored a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions establishing the assistant's behavior.
    System,
    /// The person asking questions.
    User,
    /// The assistant's replies.
    Assistant,
}

/// One turn in a conversation.
///
/// An ordered sequence of these forms the rolling history a session layer
/// passes in by value; this crate never owns session storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The author of the message.
    pub role: ChatRole,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    /// An assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Generation parameters passed to the model on every call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Model name, e.g. `gpt-4o-mini`.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { model: "gpt-4o-mini".to_string(), temperature: 0.7, max_tokens: 1000 }
    }
}

/// A whole-response completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// The generated answer text.
    pub text: String,
    /// Total tokens consumed, when the provider reports usage.
    pub total_tokens: Option<u32>,
}

/// A stream of incremental answer fragments.
///
/// Dropping the stream cancels the underlying generation request; the
/// accumulated answer is always byte-identical to the concatenation of the
/// yielded fragments.
pub type TokenStream = BoxStream<'static, Result<String>>;

/// A text generation model accepting role-tagged messages.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The provider name, reported in the orchestrator's log lines.
    fn name(&self) -> &str;

    /// Produce a single blocking completion.
    async fn generate(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<Completion>;

    /// Produce a token stream for the same request.
    async fn generate_stream(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<TokenStream>;
}
