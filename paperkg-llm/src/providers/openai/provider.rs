//! [`crate::LlmProvider`] implementation backed by an OpenAI-compatible
//! chat-completions and embeddings API.

use super::client::OpenAiClient;
use super::types::{
    CompletionRequest as WireCompletionRequest, CompletionResponse as WireCompletionResponse,
    EmbeddingRequest, EmbeddingResponse, Message, StreamChunk,
};
use crate::{ChatChunk, ChatRole, CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use paperkg_core::EmbeddingVector;

const PROVIDER: &str = "openai";

pub struct OpenAiProvider {
    client: OpenAiClient,
    model: String,
    embedding_model: Option<String>,
    embedding_dimension: Option<i32>,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: OpenAiClient::new(api_key, 60),
            model: model.into(),
            embedding_model: None,
            embedding_dimension: None,
        }
    }

    pub fn with_default_model(api_key: impl Into<String>) -> Self {
        Self::new(api_key, "gpt-4o-mini")
    }

    /// Attach an embeddings endpoint to this chat provider, e.g.
    /// `"text-embedding-3-small"` at 1536 dimensions.
    pub fn with_embeddings(mut self, model: impl Into<String>, dimensions: i32) -> Self {
        self.embedding_model = Some(model.into());
        self.embedding_dimension = Some(dimensions);
        self
    }

    fn to_wire(&self, request: &CompletionRequest, stream: bool) -> WireCompletionRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| Message {
                role: match m.role {
                    ChatRole::System => "system",
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                }
                .to_string(),
                content: m.content.clone(),
            })
            .collect();

        WireCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: Some(request.max_tokens),
            temperature: request.temperature,
            stream: if stream { Some(true) } else { None },
        }
    }

    fn finish_reason(raw: &str) -> FinishReason {
        match raw {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::MaxTokens,
            "content_filter" => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn embedding_dimension(&self) -> Option<i32> {
        self.embedding_dimension
    }

    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let wire = self.to_wire(&request, false);
        let response: WireCompletionResponse = self.client.request("chat/completions", wire).await?;
        let choice = response.choices.into_iter().next().ok_or_else(|| LlmError::MalformedResponse {
            provider: PROVIDER.to_string(),
            message: "no choices in response".to_string(),
        })?;
        Ok(CompletionResponse {
            content: choice.message.content,
            finish_reason: Self::finish_reason(&choice.finish_reason),
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
        })
    }

    async fn chat_stream(
        &self,
        request: CompletionRequest,
    ) -> Result<BoxStream<'static, Result<ChatChunk, LlmError>>, LlmError> {
        let wire = self.to_wire(&request, true);
        let response = self.client.request_stream("chat/completions", wire).await?;
        let byte_stream = response.bytes_stream();

        let stream = futures_util::stream::try_unfold(
            (byte_stream, Vec::<u8>::new()),
            |(mut byte_stream, mut buf)| async move {
                loop {
                    if let Some(line) = take_sse_line(&mut buf) {
                        match decode_line(&line) {
                            Done::Chunk(chunk) => return Ok(Some((chunk, (byte_stream, buf)))),
                            Done::Finished => return Ok(None),
                            Done::Skip => continue,
                        }
                    }
                    match byte_stream.next().await {
                        Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                        Some(Err(e)) => {
                            return Err(LlmError::ProviderError {
                                provider: PROVIDER.to_string(),
                                message: format!("stream read failed: {e}"),
                            })
                        }
                        None => return Ok(None),
                    }
                }
            },
        );

        Ok(Box::pin(stream))
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, LlmError> {
        let model = self.embedding_model.as_ref().ok_or_else(|| LlmError::Unsupported {
            provider: PROVIDER.to_string(),
            operation: "embed".to_string(),
        })?;
        let request = EmbeddingRequest {
            model: model.clone(),
            input: vec![text.to_string()],
            dimensions: self.embedding_dimension,
        };
        let response: EmbeddingResponse = self.client.request("embeddings", request).await?;
        let data = response.data.into_iter().next().ok_or_else(|| LlmError::MalformedResponse {
            provider: PROVIDER.to_string(),
            message: "no embedding data in response".to_string(),
        })?;
        Ok(EmbeddingVector::new(data.embedding, model.clone()))
    }

    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>, LlmError> {
        let model = self.embedding_model.as_ref().ok_or_else(|| LlmError::Unsupported {
            provider: PROVIDER.to_string(),
            operation: "embed_many".to_string(),
        })?;
        let request = EmbeddingRequest {
            model: model.clone(),
            input: texts.iter().map(|s| s.to_string()).collect(),
            dimensions: self.embedding_dimension,
        };
        let response: EmbeddingResponse = self.client.request("embeddings", request).await?;
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        if data.len() != texts.len() {
            return Err(LlmError::MalformedResponse {
                provider: PROVIDER.to_string(),
                message: format!("expected {} embeddings, got {}", texts.len(), data.len()),
            });
        }
        Ok(data.into_iter().map(|d| EmbeddingVector::new(d.embedding, model.clone())).collect())
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider").field("model", &self.model).finish()
    }
}

enum Done {
    Chunk(ChatChunk),
    Finished,
    Skip,
}

/// Pulls one `\n`-terminated line out of `buf`, if a full line is buffered.
fn take_sse_line(buf: &mut Vec<u8>) -> Option<String> {
    let pos = buf.iter().position(|&b| b == b'\n')?;
    let line = buf.drain(..=pos).collect::<Vec<u8>>();
    Some(String::from_utf8_lossy(&line).trim_end().to_string())
}

fn decode_line(line: &str) -> Done {
    let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) else {
        return Done::Skip;
    };
    let data = data.trim();
    if data.is_empty() {
        return Done::Skip;
    }
    if data == "[DONE]" {
        return Done::Finished;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => match chunk.choices.into_iter().next() {
            Some(choice) => Done::Chunk(ChatChunk {
                delta: choice.delta.content.unwrap_or_default(),
                finish_reason: choice.finish_reason.as_deref().map(OpenAiProvider::finish_reason),
            }),
            None => Done::Skip,
        },
        Err(_) => Done::Skip,
    }
}
