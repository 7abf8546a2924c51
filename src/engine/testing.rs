//! In-memory collaborators for engine unit tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::data::MarketDataSource;
use crate::llm::sentiment::Sentiment;
use crate::notify::Notifier;
use crate::types::{Assessed, FallbackReason, InboundMessage, Mood, PriceSeries, SentimentReading};

/// Closes whose two-change RSI (period 2) is 25.
pub const RSI_25: [f64; 3] = [100.0, 101.0, 98.0];
/// Closes whose two-change RSI (period 2) is 75.
pub const RSI_75: [f64; 3] = [100.0, 103.0, 102.0];
/// Closes whose two-change RSI (period 2) is 50.
pub const RSI_50: [f64; 3] = [100.0, 101.0, 100.0];

#[derive(Default)]
pub struct FakeMarket {
    series: HashMap<String, Vec<f64>>,
    failing: Vec<String>,
}

impl FakeMarket {
    pub fn with(mut self, ticker: &str, closes: &[f64]) -> Self {
        self.series.insert(ticker.to_string(), closes.to_vec());
        self
    }

    pub fn failing(mut self, ticker: &str) -> Self {
        self.failing.push(ticker.to_string());
        self
    }
}

#[async_trait]
impl MarketDataSource for FakeMarket {
    async fn fetch_series(&self, ticker: &str) -> Result<PriceSeries> {
        if self.failing.iter().any(|t| t == ticker) {
            return Err(anyhow!("connection reset"));
        }
        let closes = self.series.get(ticker).cloned().unwrap_or_default();
        Ok(PriceSeries::from_closes(ticker, &closes))
    }
}

pub struct FakeSentiment {
    pub score: f64,
    pub safe: bool,
    pub score_calls: AtomicUsize,
    pub safe_calls: AtomicUsize,
    pub reason_calls: AtomicUsize,
    pub questions: Mutex<Vec<String>>,
}

impl FakeSentiment {
    pub fn new(score: f64, safe: bool) -> Self {
        Self {
            score,
            safe,
            score_calls: AtomicUsize::new(0),
            safe_calls: AtomicUsize::new(0),
            reason_calls: AtomicUsize::new(0),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sentiment for FakeSentiment {
    async fn classify(&self, _headline: &str) -> Assessed<Mood> {
        Assessed::Computed(if self.safe { Mood::Neutral } else { Mood::Negative })
    }

    async fn score(&self) -> Assessed<SentimentReading> {
        self.score_calls.fetch_add(1, Ordering::SeqCst);
        Assessed::Computed(SentimentReading {
            score: self.score,
            labels: vec![],
        })
    }

    async fn reason(&self) -> Assessed<String> {
        self.reason_calls.fetch_add(1, Ordering::SeqCst);
        Assessed::Computed("Whales woke up.".to_string())
    }

    async fn is_safe(&self) -> Assessed<bool> {
        self.safe_calls.fetch_add(1, Ordering::SeqCst);
        Assessed::Computed(self.safe)
    }

    async fn ask(&self, question: &str) -> Assessed<String> {
        self.questions.lock().unwrap().push(question.to_string());
        Assessed::Computed(format!("Re {question}: HODL."))
    }

    async fn briefing(&self) -> Assessed<String> {
        Assessed::fallback(
            crate::llm::sentiment::FALLBACK_BRIEFING.to_string(),
            FallbackReason::NoHeadlines,
        )
    }
}

/// Records outbound text and replays scripted inbound batches.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    pub inbound: Mutex<VecDeque<Vec<InboundMessage>>>,
    pub cursors: Mutex<Vec<Option<i64>>>,
    pub deliver: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            deliver: true,
            ..Default::default()
        }
    }

    pub fn undeliverable() -> Self {
        Self::default()
    }

    pub fn queue(&self, batch: Vec<InboundMessage>) {
        self.inbound.lock().unwrap().push_back(batch);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> bool {
        self.sent.lock().unwrap().push(text.to_string());
        self.deliver
    }

    async fn poll(&self, cursor: Option<i64>) -> Vec<InboundMessage> {
        self.cursors.lock().unwrap().push(cursor);
        self.inbound.lock().unwrap().pop_front().unwrap_or_default()
    }
}
