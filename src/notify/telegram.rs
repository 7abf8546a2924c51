//! Telegram Bot API transport.
//!
//! API: `https://api.telegram.org/bot{token}/{method}`
//! Messages go out as plain text (no parse mode) so headlines with stray
//! markdown characters never get rejected. Inbound polling uses
//! `getUpdates` with a short long-poll timeout; the update id is the cursor.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Notifier;
use crate::types::InboundMessage;

const API_BASE: &str = "https://api.telegram.org";

/// Long-poll wait, seconds.
const POLL_TIMEOUT_SECS: u64 = 1;

const POLL_LIMIT: u32 = 100;

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

/// Decode a `getUpdates` body. Updates from any chat other than `chat_id`
/// keep their id (so the cursor moves past them) but lose their text.
fn parse_updates(body: &str, chat_id: &str) -> Result<Vec<InboundMessage>> {
    let resp: ApiResponse<Vec<Update>> =
        serde_json::from_str(body).context("Failed to parse getUpdates response")?;
    if !resp.ok {
        bail!(
            "getUpdates rejected: {}",
            resp.description.unwrap_or_else(|| "no description".into())
        );
    }

    let mut messages: Vec<InboundMessage> = resp
        .result
        .unwrap_or_default()
        .into_iter()
        .map(|u| {
            let text = u
                .message
                .filter(|m| m.chat.id.to_string() == chat_id)
                .and_then(|m| m.text);
            InboundMessage { id: u.update_id, text }
        })
        .collect();
    messages.sort_by_key(|m| m.id);
    Ok(messages)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct TelegramClient {
    http: Client,
    token: Secret<String>,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(token: Secret<String>, chat_id: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            // Must outlive the long-poll window.
            .timeout(std::time::Duration::from_secs(POLL_TIMEOUT_SECS + 15))
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(Self {
            http,
            token,
            chat_id: chat_id.into(),
        })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{API_BASE}/bot{}/{method}", self.token.expose_secret())
    }

    async fn try_send(&self, text: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            .context("sendMessage request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("sendMessage error {status}: {body}");
        }
        Ok(())
    }

    async fn try_poll(&self, cursor: Option<i64>) -> Result<Vec<InboundMessage>> {
        let mut query = vec![
            ("timeout", POLL_TIMEOUT_SECS.to_string()),
            ("limit", POLL_LIMIT.to_string()),
        ];
        if let Some(offset) = cursor {
            query.push(("offset", offset.to_string()));
        }

        let body = self
            .http
            .get(self.method_url("getUpdates"))
            .query(&query)
            .send()
            .await
            .context("getUpdates request failed")?
            .text()
            .await
            .context("Failed to read getUpdates body")?;

        parse_updates(&body, &self.chat_id)
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, text: &str) -> bool {
        match self.try_send(text).await {
            Ok(()) => {
                debug!(chars = text.len(), "Message delivered");
                true
            }
            Err(e) => {
                warn!(error = %e, "Telegram send failed");
                false
            }
        }
    }

    async fn poll(&self, cursor: Option<i64>) -> Vec<InboundMessage> {
        match self.try_poll(cursor).await {
            Ok(messages) => {
                if !messages.is_empty() {
                    debug!(count = messages.len(), ?cursor, "Updates received");
                }
                messages
            }
            Err(e) => {
                warn!(error = %e, "Telegram poll failed");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
