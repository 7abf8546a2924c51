//! In-memory collaborators for integration testing.
//!
//! Deterministic stand-ins for the price feed, the news feed, the LLM and
//! the chat transport. The real `SentimentOracle`, `ScanController`,
//! `CommandRouter` and `ProcessLoop` run on top of them unchanged.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sentinel::data::{HeadlineSource, MarketDataSource};
use sentinel::engine::commands::CommandRouter;
use sentinel::engine::runner::{LoopSettings, ProcessLoop};
use sentinel::engine::scanner::{ScanController, ScanSettings};
use sentinel::llm::sentiment::SentimentOracle;
use sentinel::llm::TextCompleter;
use sentinel::notify::Notifier;
use sentinel::strategy::signal::SignalThresholds;
use sentinel::types::{InboundMessage, PriceSeries};

/// Fifteen closes alternating `+up` / `-down`: fourteen changes, so the
/// 14-period RSI is exactly `100 - 100 / (1 + up / down)`.
pub fn zigzag(up: f64, down: f64) -> Vec<f64> {
    let mut closes = vec![200.0];
    for i in 0..14 {
        let last = closes[closes.len() - 1];
        closes.push(if i % 2 == 0 { last + up } else { last - down });
    }
    closes
}

/// RSI 25.
pub fn oversold() -> Vec<f64> {
    zigzag(1.0, 3.0)
}

/// RSI 75.
pub fn overbought() -> Vec<f64> {
    zigzag(3.0, 1.0)
}

/// RSI 50.
pub fn neutral() -> Vec<f64> {
    zigzag(1.0, 1.0)
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StaticMarket {
    closes: HashMap<String, Vec<f64>>,
}

impl StaticMarket {
    pub fn with(mut self, ticker: &str, closes: Vec<f64>) -> Self {
        self.closes.insert(ticker.to_string(), closes);
        self
    }
}

#[async_trait]
impl MarketDataSource for StaticMarket {
    async fn fetch_series(&self, ticker: &str) -> Result<PriceSeries> {
        match self.closes.get(ticker) {
            Some(c) => Ok(PriceSeries::from_closes(ticker, c)),
            None => Err(anyhow!("404 for {ticker}")),
        }
    }
}

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

pub struct StaticHeadlines {
    headlines: Option<Vec<String>>,
}

impl StaticHeadlines {
    pub fn new(headlines: &[&str]) -> Self {
        Self {
            headlines: Some(headlines.iter().map(|h| h.to_string()).collect()),
        }
    }

    pub fn down() -> Self {
        Self { headlines: None }
    }
}

#[async_trait]
impl HeadlineSource for StaticHeadlines {
    async fn latest_headlines(&self, limit: usize) -> Result<Vec<String>> {
        match &self.headlines {
            Some(h) => Ok(h.iter().take(limit).cloned().collect()),
            None => Err(anyhow!("feed timed out")),
        }
    }
}

// ---------------------------------------------------------------------------
// LLM
// ---------------------------------------------------------------------------

/// Answers by prompt kind. Headlines mentioning "hack" read NEGATIVE, those
/// mentioning "record" read POSITIVE, everything else NEUTRAL.
pub struct KeywordLlm {
    online: bool,
}

impl KeywordLlm {
    pub fn online() -> Self {
        Self { online: true }
    }

    pub fn offline() -> Self {
        Self { online: false }
    }
}

#[async_trait]
impl TextCompleter for KeywordLlm {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        if !self.online {
            return Err(anyhow!("OpenRouter API error 503"));
        }
        let reply = if system.contains("POSITIVE, NEGATIVE, or NEUTRAL") {
            if user.contains("hack") {
                "NEGATIVE"
            } else if user.contains("record") {
                "POSITIVE."
            } else {
                "neutral"
            }
        } else if system.contains("ONE short sentence") {
            "ETF flows are doing the heavy lifting."
        } else if system.contains("bullet") {
            "- ETFs\n- Hacks\n- Fed"
        } else {
            return Ok(format!("About \"{user}\": zoom out."));
        };
        Ok(reply.to_string())
    }

    fn model_name(&self) -> String {
        "keyword-llm".to_string()
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ChatLog {
    sent: Mutex<Vec<String>>,
    inbound: Mutex<VecDeque<Vec<InboundMessage>>>,
    cursors: Mutex<Vec<Option<i64>>>,
}

impl ChatLog {
    pub fn queue(&self, batch: Vec<InboundMessage>) {
        self.inbound.lock().unwrap().push_back(batch);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn cursors(&self) -> Vec<Option<i64>> {
        self.cursors.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for ChatLog {
    async fn send(&self, text: &str) -> bool {
        self.sent.lock().unwrap().push(text.to_string());
        true
    }

    async fn poll(&self, cursor: Option<i64>) -> Vec<InboundMessage> {
        self.cursors.lock().unwrap().push(cursor);
        self.inbound.lock().unwrap().pop_front().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

pub struct Bot {
    pub chat: Arc<ChatLog>,
    pub scanner: Arc<ScanController>,
    pub process: ProcessLoop,
}

pub fn build_bot(market: StaticMarket, headlines: StaticHeadlines, llm: KeywordLlm) -> Bot {
    let chat = Arc::new(ChatLog::default());
    let watchlist: Vec<String> = ["BTC-USD", "ETH-USD", "SOL-USD", "XRP-USD"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let sentiment = Arc::new(SentimentOracle::new(Arc::new(llm), Arc::new(headlines)));
    let scanner = Arc::new(ScanController::new(
        Arc::new(market),
        sentiment.clone(),
        chat.clone(),
        ScanSettings {
            watchlist,
            thresholds: SignalThresholds::default(),
            rsi_period: 14,
        },
    ));
    let hour = Duration::from_secs(3600);
    let router = CommandRouter::new(scanner.clone(), sentiment.clone(), chat.clone(), hour);
    let process = ProcessLoop::new(
        chat.clone(),
        sentiment,
        scanner.clone(),
        router,
        LoopSettings {
            scan_interval: hour,
            poll_interval: Duration::from_millis(1),
            error_pause: Duration::from_millis(1),
            briefing_hour: Some(8),
        },
    );

    Bot {
        chat,
        scanner,
        process,
    }
}
