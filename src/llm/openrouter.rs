//! OpenRouter LLM integration.
//!
//! Routes completion calls through OpenRouter's unified API using the
//! OpenAI-compatible chat completions format. One attempt per call: callers
//! turn any failure into a documented default, so there is no retry loop here.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::TextCompleter;
use crate::config::LlmConfig;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const DEFAULT_MODEL: &str = "google/gemma-3-27b-it:free";

const DEFAULT_MAX_TOKENS: u32 = 256;

// ---------------------------------------------------------------------------
// API types (OpenAI-compatible)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: u32,
}

/// Pull the first choice's text out of a response body.
fn extract_reply(body: ChatResponse) -> Result<String> {
    let text = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .map(|m| m.content.trim().to_string())
        .unwrap_or_default();
    if text.is_empty() {
        bail!("OpenRouter returned an empty completion");
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpenRouterClient {
    http: Client,
    api_key: Option<Secret<String>>,
    model: String,
    max_tokens: u32,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client.
    ///
    /// With no API key every call fails fast, which the sentiment layer
    /// turns into its neutral defaults.
    pub fn new(
        api_key: Option<Secret<String>>,
        model: Option<String>,
        max_tokens: Option<u32>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to build OpenRouter HTTP client")?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }

    pub fn from_config(config: &LlmConfig, api_key: Option<Secret<String>>) -> Result<Self> {
        Self::new(api_key, Some(config.model.clone()), Some(config.max_tokens))
    }

    fn build_request(&self, system: &str, user: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        }
    }
}

#[async_trait]
impl TextCompleter for OpenRouterClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_ref() else {
            bail!("No OpenRouter API key configured");
        };

        let request = self.build_request(system, user);

        let response = self
            .http
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", api_key.expose_secret()))
            .header("Content-Type", "application/json")
            .header("X-Title", "SENTINEL Crypto Watch")
            .json(&request)
            .send()
            .await
            .context("OpenRouter request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(%status, model = %self.model, error = %error_text, "OpenRouter API error");
            bail!("OpenRouter API error {status} (model={}): {error_text}", self.model);
        }

        let body: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenRouter response")?;

        let tokens = body.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0);
        let served_by = body.model.clone().unwrap_or_else(|| self.model.clone());
        let text = extract_reply(body)?;

        debug!(model = %served_by, tokens, chars = text.len(), "Completion received");
        Ok(text)
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
