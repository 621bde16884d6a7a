//! OpenAI-compatible chat-completions and embeddings provider.

mod client;
mod provider;
mod types;

pub use client::OpenAiClient;
pub use provider::OpenAiProvider;
