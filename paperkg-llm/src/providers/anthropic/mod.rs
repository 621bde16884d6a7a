//! Anthropic Messages API provider.

mod client;
mod provider;
mod types;

pub use client::AnthropicClient;
pub use provider::AnthropicProvider;
