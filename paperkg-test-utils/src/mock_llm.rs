//! A deterministic [`LlmProvider`] for tests that need an `LlmProvider`
//! without a network call: entity confirmation, intent classification, and
//! Cypher generation can all run against this and get reproducible output.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use paperkg_core::EmbeddingVector;
use paperkg_llm::{ChatChunk, CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider};
use std::sync::Mutex;

/// Hashes `text`'s bytes into a fixed-dimension vector and L2-normalizes it,
/// so the same input always embeds to the same output and unrelated inputs
/// land far apart without needing a real embedding model.
fn hash_embed(text: &str, dimensions: usize) -> Vec<f32> {
    let mut state: u64 = 0xcbf29ce484222325;
    let mut data = vec![0.0f32; dimensions];
    for (i, byte) in text.bytes().enumerate() {
        state ^= byte as u64;
        state = state.wrapping_mul(0x100000001b3);
        data[i % dimensions] += ((state % 1000) as f32) / 1000.0 - 0.5;
    }
    let norm = data.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in data.iter_mut() {
            *x /= norm;
        }
    }
    data
}

/// A scripted or echo-based [`LlmProvider`].
///
/// With no scripted responses queued, `chat` echoes the last user message
/// back wrapped in a fixed preamble; tests that need a specific reply (e.g.
/// a JSON object an entity confirmer will parse) should queue one with
/// [`MockLlmProvider::push_response`].
pub struct MockLlmProvider {
    model: String,
    embedding_dimension: i32,
    queued_responses: Mutex<Vec<String>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self { model: "mock-model".to_string(), embedding_dimension: 16, queued_responses: Mutex::new(Vec::new()) }
    }

    pub fn with_embedding_dimension(mut self, dimensions: i32) -> Self {
        self.embedding_dimension = dimensions;
        self
    }

    /// Queue a response to be returned by the next `chat` call, FIFO.
    pub fn push_response(&self, text: impl Into<String>) {
        self.queued_responses.lock().unwrap().push(text.into());
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn embedding_dimension(&self) -> Option<i32> {
        Some(self.embedding_dimension)
    }

    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let queued = {
            let mut queue = self.queued_responses.lock().unwrap();
            if queue.is_empty() {
                None
            } else {
                Some(queue.remove(0))
            }
        };
        let content = match queued {
            Some(text) => text,
            None => {
                let last_user = request
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.role == paperkg_llm::ChatRole::User)
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                format!("mock-reply: {last_user}")
            }
        };
        Ok(CompletionResponse {
            content,
            finish_reason: FinishReason::Stop,
            input_tokens: request.messages.len() as i64,
            output_tokens: 1,
        })
    }

    async fn chat_stream(
        &self,
        request: CompletionRequest,
    ) -> Result<BoxStream<'static, Result<ChatChunk, LlmError>>, LlmError> {
        let response = self.chat(request).await?;
        let chunks = vec![
            Ok(ChatChunk { delta: response.content, finish_reason: None }),
            Ok(ChatChunk { delta: String::new(), finish_reason: Some(response.finish_reason) }),
        ];
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, LlmError> {
        let data = hash_embed(text, self.embedding_dimension as usize);
        Ok(EmbeddingVector::new(data, self.model.clone()))
    }

    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>, LlmError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedding_of_the_same_text_is_identical() {
        let provider = MockLlmProvider::new();
        let a = provider.embed("graph neural networks").await.unwrap();
        let b = provider.embed("graph neural networks").await.unwrap();
        assert_eq!(a.data, b.data);
        assert!(a.is_valid());
    }

    #[tokio::test]
    async fn embeddings_of_different_text_differ() {
        let provider = MockLlmProvider::new();
        let a = provider.embed("graph neural networks").await.unwrap();
        let b = provider.embed("transformer architectures").await.unwrap();
        assert_ne!(a.data, b.data);
    }

    #[tokio::test]
    async fn queued_response_is_returned_before_falling_back_to_echo() {
        let provider = MockLlmProvider::new();
        provider.push_response(r#"{"confirmed": true}"#);
        let request = CompletionRequest::new(vec![paperkg_llm::ChatMessage::user("confirm this entity")], 100);
        let response = provider.chat(request).await.unwrap();
        assert_eq!(response.content, r#"{"confirmed": true}"#);
    }

    #[tokio::test]
    async fn chat_stream_ends_with_a_finish_reason() {
        let provider = MockLlmProvider::new();
        let request = CompletionRequest::new(vec![paperkg_llm::ChatMessage::user("hi")], 10);
        let mut stream = provider.chat_stream(request).await.unwrap();
        use futures_util::StreamExt;
        let mut last_finish = None;
        while let Some(chunk) = stream.next().await {
            last_finish = chunk.unwrap().finish_reason.or(last_finish);
        }
        assert_eq!(last_finish, Some(FinishReason::Stop));
    }
}
