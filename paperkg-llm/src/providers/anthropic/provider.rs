//! [`crate::LlmProvider`] implementation backed by Claude models.
//!
//! Anthropic has no embeddings endpoint, so [`AnthropicProvider::embed`] and
//! [`AnthropicProvider::embed_many`] return [`LlmError::Unsupported`] rather
//! than pretending to support a capability the API doesn't offer.

use super::client::AnthropicClient;
use super::types::{ContentBlock, Message, MessageRequest, MessageResponse, StreamDelta, StreamEvent};
use crate::{ChatChunk, ChatRole, CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use paperkg_core::EmbeddingVector;

const PROVIDER: &str = "anthropic";

pub struct AnthropicProvider {
    client: AnthropicClient,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { client: AnthropicClient::new(api_key, 50), model: model.into() }
    }

    pub fn with_default_model(api_key: impl Into<String>) -> Self {
        Self::new(api_key, "claude-3-5-sonnet-20241022")
    }

    fn to_wire(&self, request: &CompletionRequest, stream: bool) -> MessageRequest {
        let mut system = None;
        let mut messages = Vec::with_capacity(request.messages.len());
        for m in &request.messages {
            match m.role {
                ChatRole::System => system = Some(m.content.clone()),
                ChatRole::User => messages.push(Message { role: "user".to_string(), content: m.content.clone() }),
                ChatRole::Assistant => {
                    messages.push(Message { role: "assistant".to_string(), content: m.content.clone() })
                }
            }
        }
        MessageRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            system,
            temperature: request.temperature,
            stream: if stream { Some(true) } else { None },
        }
    }

    fn finish_reason(stop_reason: Option<&str>) -> FinishReason {
        match stop_reason {
            Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
            Some("max_tokens") => FinishReason::MaxTokens,
            _ => FinishReason::Other,
        }
    }

    fn extract_text(content: Vec<ContentBlock>) -> String {
        content
            .into_iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let wire = self.to_wire(&request, false);
        let response: MessageResponse = self.client.request("messages", wire).await?;
        Ok(CompletionResponse {
            content: Self::extract_text(response.content),
            finish_reason: Self::finish_reason(response.stop_reason.as_deref()),
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        })
    }

    async fn chat_stream(
        &self,
        request: CompletionRequest,
    ) -> Result<BoxStream<'static, Result<ChatChunk, LlmError>>, LlmError> {
        let wire = self.to_wire(&request, true);
        let response = self.client.request_stream("messages", wire).await?;
        let byte_stream = response.bytes_stream();

        let stream = futures_util::stream::try_unfold(
            (byte_stream, Vec::<u8>::new()),
            |(mut byte_stream, mut buf)| async move {
                loop {
                    if let Some(event) = take_sse_event(&mut buf) {
                        if let Some(chunk) = decode_event(&event) {
                            return Ok(Some((chunk, (byte_stream, buf))));
                        }
                        continue;
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

    async fn embed(&self, _text: &str) -> Result<EmbeddingVector, LlmError> {
        Err(LlmError::Unsupported { provider: PROVIDER.to_string(), operation: "embed".to_string() })
    }

    async fn embed_many(&self, _texts: &[&str]) -> Result<Vec<EmbeddingVector>, LlmError> {
        Err(LlmError::Unsupported { provider: PROVIDER.to_string(), operation: "embed_many".to_string() })
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider").field("model", &self.model).finish()
    }
}

/// Pulls one complete `\n\n`-terminated SSE event out of `buf`, if present.
fn take_sse_event(buf: &mut Vec<u8>) -> Option<String> {
    let pos = buf.windows(2).position(|w| w == b"\n\n")?;
    let event = buf.drain(..pos + 2).collect::<Vec<u8>>();
    Some(String::from_utf8_lossy(&event).into_owned())
}

/// Decodes the `data: ...` line(s) of one SSE event into a [`ChatChunk`],
/// skipping events that carry no visible delta (e.g. `message_start`).
fn decode_event(event: &str) -> Option<ChatChunk> {
    let data = event
        .lines()
        .find_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))?;

    match serde_json::from_str::<StreamEvent>(data).ok()? {
        StreamEvent::ContentBlockDelta { delta: StreamDelta::TextDelta { text } } => {
            Some(ChatChunk { delta: text, finish_reason: None })
        }
        StreamEvent::MessageDelta { delta } => Some(ChatChunk {
            delta: String::new(),
            finish_reason: Some(AnthropicProvider::finish_reason(delta.stop_reason.as_deref())),
        }),
        _ => None,
    }
}
