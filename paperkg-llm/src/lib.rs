//! LLM provider and vector index boundary.
//!
//! `LlmProvider` is the single seam every reasoning-adjacent subsystem talks
//! through: entity confirmation (normalization), intent classification and
//! Cypher generation (NLQ), and summarization all call through this trait
//! rather than a concrete HTTP client. `VectorIndex` is kept separate
//! because it has a different backing store (an embedding index, not a
//! chat API) and a different failure mode.
//!
//! Two illustrative HTTP-backed providers live under [`providers`]. They are
//! independent implementations, not subclasses of a shared base: each owns
//! its own request/response wire types and its own rate limiter instance,
//! mirroring how the pipeline's bibliographic source clients are each
//! self-contained.

pub mod providers;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use paperkg_core::EmbeddingVector;
use serde_json::Value;
use thiserror::Error;

/// A single turn in a chat-style completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: i32,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, max_tokens: i32) -> Self {
        Self { messages, max_tokens, temperature: None }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    ContentFilter,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub finish_reason: FinishReason,
    pub input_tokens: i64,
    pub output_tokens: i64,
}

/// One incremental piece of a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatChunk {
    pub delta: String,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider} rate limited the request")]
    RateLimited { provider: String },

    #[error("{provider} rejected the API key")]
    InvalidApiKey { provider: String },

    #[error("{provider} does not support {operation}")]
    Unsupported { provider: String, operation: String },

    #[error("{provider}: {message}")]
    ProviderError { provider: String, message: String },

    #[error("{provider}: malformed response ({message})")]
    MalformedResponse { provider: String, message: String },
}

impl paperkg_core::Retryable for LlmError {
    fn is_retryable(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. } | LlmError::ProviderError { .. })
    }
}

/// Chat, streaming chat, and embedding access to one model family.
///
/// Implementors own their HTTP client, authentication, and rate limiting;
/// callers never see transport details.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider identifier used in error messages and logs, e.g.
    /// `"anthropic"`.
    fn provider(&self) -> &str;

    /// The concrete model this instance talks to, e.g.
    /// `"claude-3-5-sonnet-20241022"`.
    fn model_name(&self) -> &str;

    /// `Some(n)` when this provider can embed text into `n`-dimensional
    /// vectors; `None` for chat-only providers.
    fn embedding_dimension(&self) -> Option<i32> {
        None
    }

    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    async fn chat_stream(
        &self,
        request: CompletionRequest,
    ) -> Result<BoxStream<'static, Result<ChatChunk, LlmError>>, LlmError>;

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, LlmError>;

    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>, LlmError>;
}

/// A single similarity-search hit against a vector index collection.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub entity_id: String,
    pub score: f32,
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchRequest {
    pub collection: String,
    pub vector: Vec<f32>,
    pub limit: usize,
    pub with_payload: bool,
}

/// The similarity-matching stage's boundary to an embedding index. Kept
/// separate from [`LlmProvider`] because the backing store, failure modes,
/// and lifecycle (index population vs. per-call inference) differ.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(&self, request: VectorSearchRequest) -> Result<Vec<VectorHit>, LlmError>;
}
