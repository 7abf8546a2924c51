//! Shared types for the SENTINEL bot.
//!
//! Everything here is transient and process-lifetime only: price series
//! live for one scan pass, sentiment readings for one request, and alert
//! decisions for the pass that produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Price data
// ---------------------------------------------------------------------------

/// One OHLCV sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Time-ordered price history for one ticker (ascending by timestamp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    /// Build a series from close prices alone, one bar per hour.
    /// Handy for tests and for providers that only report closes.
    pub fn from_closes(ticker: impl Into<String>, closes: &[f64]) -> Self {
        let start = DateTime::<Utc>::default();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: start + chrono::Duration::hours(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0,
            })
            .collect();
        Self::new(ticker, bars)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}

impl fmt::Display for PriceSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "{} ({} bars, {} → {}, last close {:.4})",
                self.ticker,
                self.bars.len(),
                first.timestamp.format("%Y-%m-%d %H:%M"),
                last.timestamp.format("%Y-%m-%d %H:%M"),
                last.close,
            ),
            _ => write!(f, "{} (empty)", self.ticker),
        }
    }
}

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

/// Headline classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Positive,
    Negative,
    Neutral,
}

impl Mood {
    pub const ALL: &'static [Mood] = &[Mood::Positive, Mood::Negative, Mood::Neutral];

    /// Contribution of this label to the aggregate sentiment score.
    pub fn weight(&self) -> f64 {
        match self {
            Mood::Positive => 1.0,
            Mood::Neutral => 0.5,
            Mood::Negative => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mood::Positive => "POSITIVE",
            Mood::Negative => "NEGATIVE",
            Mood::Neutral => "NEUTRAL",
        }
    }

    /// Parse a model reply into a label.
    ///
    /// Only the bare label is accepted (any case, surrounding punctuation
    /// ignored). Anything longer, such as "NOT NEGATIVE", is unrecognised.
    pub fn from_completion(text: &str) -> Option<Mood> {
        let cleaned = text
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphabetic())
            .to_ascii_uppercase();

        Mood::ALL.iter().copied().find(|m| m.label() == cleaned)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Aggregate sentiment for one request: a 0.0–1.0 score and the labels
/// it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub score: f64,
    pub labels: Vec<Mood>,
}

impl SentimentReading {
    /// Score used when there is nothing to classify.
    pub const NEUTRAL_SCORE: f64 = 0.5;

    pub fn neutral() -> Self {
        Self {
            score: Self::NEUTRAL_SCORE,
            labels: Vec::new(),
        }
    }

    /// Mean label weight; neutral when `labels` is empty.
    pub fn from_labels(labels: Vec<Mood>) -> Self {
        if labels.is_empty() {
            return Self::neutral();
        }
        let total: f64 = labels.iter().map(Mood::weight).sum();
        Self {
            score: total / labels.len() as f64,
            labels,
        }
    }

    /// Score as a whole percentage (0–100).
    pub fn percent(&self) -> u32 {
        (self.score.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

impl fmt::Display for SentimentReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.labels.iter().map(Mood::label).collect();
        write!(f, "{}% [{}]", self.percent(), labels.join(", "))
    }
}

// ---------------------------------------------------------------------------
// AI results
// ---------------------------------------------------------------------------

/// Why an AI-backed value is a default rather than a real answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FallbackReason {
    #[error("upstream unavailable: {0}")]
    Upstream(String),
    #[error("no headlines available")]
    NoHeadlines,
    #[error("empty completion")]
    EmptyCompletion,
    #[error("unrecognised completion: {0:?}")]
    Unparseable(String),
}

/// Result of an AI-backed call: either a computed value or a documented
/// default together with the reason it was used.
#[derive(Debug, Clone, PartialEq)]
pub enum Assessed<T> {
    Computed(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Assessed<T> {
    pub fn fallback(value: T, reason: FallbackReason) -> Self {
        Assessed::Fallback { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Assessed::Computed(v) => v,
            Assessed::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Assessed::Computed(v) => v,
            Assessed::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Assessed::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Assessed::Computed(_) => None,
            Assessed::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Assessed<U> {
        match self {
            Assessed::Computed(v) => Assessed::Computed(f(v)),
            Assessed::Fallback { value, reason } => Assessed::Fallback {
                value: f(value),
                reason,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Scan outcomes
// ---------------------------------------------------------------------------

/// Whether a scan pass was requested by the user or fired by the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanMode {
    Manual,
    Scheduled,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Manual => write!(f, "manual"),
            ScanMode::Scheduled => write!(f, "scheduled"),
        }
    }
}

/// Alert outcome for one ticker in one pass.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertDecision {
    None {
        ticker: String,
        rsi: f64,
    },
    Buy {
        ticker: String,
        rsi: f64,
        /// Whole percentage, rounded down.
        confidence: u32,
        reason: String,
    },
    Sell {
        ticker: String,
        rsi: f64,
        reason: String,
    },
}

impl AlertDecision {
    pub fn ticker(&self) -> &str {
        match self {
            AlertDecision::None { ticker, .. }
            | AlertDecision::Buy { ticker, .. }
            | AlertDecision::Sell { ticker, .. } => ticker,
        }
    }

    pub fn rsi(&self) -> f64 {
        match self {
            AlertDecision::None { rsi, .. }
            | AlertDecision::Buy { rsi, .. }
            | AlertDecision::Sell { rsi, .. } => *rsi,
        }
    }

    pub fn is_alert(&self) -> bool {
        !matches!(self, AlertDecision::None { .. })
    }

    /// Chat message for this decision, if it is an alert.
    pub fn message(&self) -> Option<String> {
        match self {
            AlertDecision::None { .. } => None,
            AlertDecision::Buy {
                ticker,
                rsi,
                confidence,
                reason,
            } => Some(format!(
                "🚨 BUY ALERT: {ticker} is cheap!\n\
                 📉 RSI: {rsi:.2}\n\
                 🎯 Confidence: {confidence}%\n\
                 💬 {reason}"
            )),
            AlertDecision::Sell { ticker, rsi, reason } => Some(format!(
                "🚨 SELL ALERT: {ticker} is expensive!\n\
                 📈 RSI: {rsi:.2}\n\
                 💬 {reason}"
            )),
        }
    }
}

impl fmt::Display for AlertDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertDecision::None { ticker, rsi } => write!(f, "NONE {ticker} (RSI {rsi:.2})"),
            AlertDecision::Buy {
                ticker,
                rsi,
                confidence,
                ..
            } => write!(f, "BUY {ticker} (RSI {rsi:.2}, conf {confidence}%)"),
            AlertDecision::Sell { ticker, rsi, .. } => write!(f, "SELL {ticker} (RSI {rsi:.2})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// One inbound chat update. `text` is `None` for non-text updates and for
/// messages from chats other than the configured one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: i64,
    pub text: Option<String>,
}

impl InboundMessage {
    pub fn text(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: Some(text.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
