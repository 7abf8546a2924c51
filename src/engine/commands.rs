//! Chat command parsing and dispatch.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::scanner::ScanController;
use crate::dashboard::AppState;
use crate::llm::sentiment::Sentiment;
use crate::notify::Notifier;
use crate::types::ScanMode;

pub const CHECK_ACK: &str = "🔄 Checking prices now...";

pub const HELP_TEXT: &str = "Available commands:\n\
     /status - System health\n\
     /check - Force price check\n\
     /sentiment - News mood right now\n\
     /ask <question> - Ask the bot anything\n\
     /help - This list";

/// Every command the bot understands. Anything else parses to
/// `Unrecognized` and is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Check,
    Sentiment,
    /// Question text with surrounding whitespace removed; may be empty.
    Ask(String),
    Help,
    Unrecognized,
}

impl Command {
    /// Parse one inbound message. The keyword is case-insensitive and may
    /// carry an `@botname` suffix; the `/ask` argument keeps its case.
    pub fn parse(text: &str) -> Command {
        let text = text.trim();
        let (keyword, rest) = match text.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (text, ""),
        };
        let keyword = keyword.split('@').next().unwrap_or(keyword).to_lowercase();

        match keyword.as_str() {
            "/status" if rest.is_empty() => Command::Status,
            "/check" if rest.is_empty() => Command::Check,
            "/sentiment" if rest.is_empty() => Command::Sentiment,
            "/help" if rest.is_empty() => Command::Help,
            "/ask" => Command::Ask(rest.to_string()),
            _ => Command::Unrecognized,
        }
    }
}

pub fn status_message(watch_count: usize, scan_interval: Duration) -> String {
    format!(
        "✅ Bot is Online.\n👀 Watching: {watch_count} coins\n⏳ Interval: {}s",
        scan_interval.as_secs()
    )
}

pub struct CommandRouter {
    scanner: Arc<ScanController>,
    sentiment: Arc<dyn Sentiment>,
    notifier: Arc<dyn Notifier>,
    scan_interval: Duration,
    status: Option<AppState>,
}

impl CommandRouter {
    pub fn new(
        scanner: Arc<ScanController>,
        sentiment: Arc<dyn Sentiment>,
        notifier: Arc<dyn Notifier>,
        scan_interval: Duration,
    ) -> Self {
        Self {
            scanner,
            sentiment,
            notifier,
            scan_interval,
            status: None,
        }
    }

    pub fn with_status(mut self, status: AppState) -> Self {
        self.status = Some(status);
        self
    }

    /// Parse and act on one message. Returns whether anything was done.
    pub async fn handle_text(&self, text: &str) -> bool {
        let command = Command::parse(text);
        debug!(?command, "Command parsed");
        self.dispatch(&command).await
    }

    pub async fn dispatch(&self, command: &Command) -> bool {
        match command {
            Command::Status => {
                let msg = status_message(self.scanner.settings().watchlist.len(), self.scan_interval);
                self.notifier.send(&msg).await;
            }
            Command::Check => {
                self.notifier.send(CHECK_ACK).await;
                self.scanner.run_pass(ScanMode::Manual).await;
            }
            Command::Sentiment => {
                let reading = self.sentiment.score().await.into_value();
                let reason = self.sentiment.reason().await.into_value();
                let msg = format!("🧠 Market Sentiment: {}%\n💬 {reason}", reading.percent());
                self.notifier.send(&msg).await;
            }
            Command::Ask(question) if question.is_empty() => {
                debug!("Empty /ask ignored");
                return false;
            }
            Command::Ask(question) => {
                let answer = self.sentiment.ask(question).await;
                if answer.is_fallback() {
                    info!(question = %question, "Answering with fallback");
                }
                self.notifier.send(answer.value()).await;
            }
            Command::Help => {
                self.notifier.send(HELP_TEXT).await;
            }
            Command::Unrecognized => return false,
        }

        info!(?command, "Command handled");
        if let Some(status) = &self.status {
            status.bot.write().await.record_command();
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
