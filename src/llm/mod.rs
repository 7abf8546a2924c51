//! LLM integration for headline sentiment and market commentary.
//!
//! Defines the `TextCompleter` trait (one system prompt + one user message
//! in, one reply out), the OpenRouter implementation, and the sentiment
//! oracle built on top of it.

pub mod openrouter;
pub mod sentiment;

use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over chat-completion backends.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    /// Send one system + user exchange and return the raw reply text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Model identifier string.
    fn model_name(&self) -> String;
}
