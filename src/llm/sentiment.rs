//! News sentiment oracle.
//!
//! Wraps a `TextCompleter` and a `HeadlineSource` behind the `Sentiment`
//! trait. Every operation is fault-tolerant: an upstream failure never
//! propagates, it resolves to a fixed default wrapped in
//! [`Assessed::Fallback`] so callers can tell a real NEUTRAL from a dead API.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::TextCompleter;
use crate::data::HeadlineSource;
use crate::types::{Assessed, FallbackReason, Mood, SentimentReading};

// ---------------------------------------------------------------------------
// Prompts and defaults
// ---------------------------------------------------------------------------

const CLASSIFY_PROMPT: &str =
    "Analyze crypto news. Reply ONLY: POSITIVE, NEGATIVE, or NEUTRAL.";

const REASON_PROMPT: &str =
    "Summarize why the crypto market is moving in ONE short sentence. Be casual.";

const BRIEFING_PROMPT: &str =
    "Provide 3 short bullet points of crypto news. No bolding. Use '-'.";

const ASK_PROMPT: &str = "You are 'Matatu Pilot', a sarcastic crypto pro. Max 2 sentences.";

pub const FALLBACK_REASON: &str = "Market is showing typical volatility.";
pub const FALLBACK_ANSWER: &str = "The engine is stalling. Ask me later.";
pub const FALLBACK_BRIEFING: &str = "Check your charts, headlines are stuck.";

/// Default number of headlines considered per call.
pub const DEFAULT_HEADLINE_LIMIT: usize = 3;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// AI-backed market mood. Implementations must never fail; see module docs.
#[async_trait]
pub trait Sentiment: Send + Sync {
    /// Label one headline. Defaults to NEUTRAL.
    async fn classify(&self, headline: &str) -> Assessed<Mood>;

    /// Mean label weight over the latest headlines. Defaults to 0.5.
    async fn score(&self) -> Assessed<SentimentReading>;

    /// One casual sentence on why the market is moving.
    async fn reason(&self) -> Assessed<String>;

    /// `false` iff any of the latest headlines reads NEGATIVE.
    async fn is_safe(&self) -> Assessed<bool>;

    /// Short in-character answer to a free-text question.
    async fn ask(&self, question: &str) -> Assessed<String>;

    /// Three bullet points summarising the latest headlines.
    async fn briefing(&self) -> Assessed<String>;
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

pub struct SentimentOracle {
    llm: Arc<dyn TextCompleter>,
    headlines: Arc<dyn HeadlineSource>,
    headline_limit: usize,
}

impl SentimentOracle {
    pub fn new(llm: Arc<dyn TextCompleter>, headlines: Arc<dyn HeadlineSource>) -> Self {
        Self {
            llm,
            headlines,
            headline_limit: DEFAULT_HEADLINE_LIMIT,
        }
    }

    pub fn with_headline_limit(mut self, limit: usize) -> Self {
        self.headline_limit = limit.max(1);
        self
    }

    async fn completion(&self, system: &str, user: &str) -> Result<String, FallbackReason> {
        match self.llm.complete(system, user).await {
            Ok(text) if text.trim().is_empty() => Err(FallbackReason::EmptyCompletion),
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) => {
                warn!(model = %self.llm.model_name(), error = %e, "Completion failed");
                Err(FallbackReason::Upstream(e.to_string()))
            }
        }
    }

    async fn fetch_headlines(&self) -> Result<Vec<String>, FallbackReason> {
        self.headlines
            .latest_headlines(self.headline_limit)
            .await
            .map(|mut h| {
                h.truncate(self.headline_limit);
                h
            })
            .map_err(|e| {
                warn!(error = %e, "Headline fetch failed");
                FallbackReason::Upstream(e.to_string())
            })
    }
}

fn bullet_list(headlines: &[String]) -> String {
    if headlines.is_empty() {
        return "(no headlines available)".to_string();
    }
    headlines
        .iter()
        .map(|h| format!("- {h}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First non-empty line of a reply.
fn first_line(text: &str) -> &str {
    text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or(text)
}

#[async_trait]
impl Sentiment for SentimentOracle {
    async fn classify(&self, headline: &str) -> Assessed<Mood> {
        let reply = match self.completion(CLASSIFY_PROMPT, headline).await {
            Ok(r) => r,
            Err(reason) => return Assessed::fallback(Mood::Neutral, reason),
        };
        match Mood::from_completion(&reply) {
            Some(mood) => {
                debug!(headline, %mood, "Headline classified");
                Assessed::Computed(mood)
            }
            None => {
                debug!(headline, reply = %reply, "Unrecognised classification, using NEUTRAL");
                Assessed::fallback(Mood::Neutral, FallbackReason::Unparseable(reply))
            }
        }
    }

    async fn score(&self) -> Assessed<SentimentReading> {
        let headlines = match self.fetch_headlines().await {
            Ok(h) => h,
            Err(reason) => return Assessed::fallback(SentimentReading::neutral(), reason),
        };
        if headlines.is_empty() {
            return Assessed::fallback(SentimentReading::neutral(), FallbackReason::NoHeadlines);
        }

        let mut labels = Vec::with_capacity(headlines.len());
        for headline in &headlines {
            labels.push(self.classify(headline).await.into_value());
        }
        let reading = SentimentReading::from_labels(labels);
        debug!(reading = %reading, "Sentiment scored");
        Assessed::Computed(reading)
    }

    async fn reason(&self) -> Assessed<String> {
        // Commentary is still worth asking for without headlines.
        let headlines = self.fetch_headlines().await.unwrap_or_default();
        match self.completion(REASON_PROMPT, &bullet_list(&headlines)).await {
            Ok(text) => Assessed::Computed(first_line(&text).to_string()),
            Err(reason) => Assessed::fallback(FALLBACK_REASON.to_string(), reason),
        }
    }

    async fn is_safe(&self) -> Assessed<bool> {
        let headlines = match self.fetch_headlines().await {
            Ok(h) => h,
            Err(reason) => return Assessed::fallback(true, reason),
        };
        for headline in &headlines {
            if self.classify(headline).await.into_value() == Mood::Negative {
                debug!(headline, "Negative headline found");
                return Assessed::Computed(false);
            }
        }
        Assessed::Computed(true)
    }

    async fn ask(&self, question: &str) -> Assessed<String> {
        match self.completion(ASK_PROMPT, question).await {
            Ok(text) => Assessed::Computed(text),
            Err(reason) => Assessed::fallback(FALLBACK_ANSWER.to_string(), reason),
        }
    }

    async fn briefing(&self) -> Assessed<String> {
        let headlines = match self.fetch_headlines().await {
            Ok(h) if h.is_empty() => {
                return Assessed::fallback(FALLBACK_BRIEFING.to_string(), FallbackReason::NoHeadlines)
            }
            Ok(h) => h,
            Err(reason) => return Assessed::fallback(FALLBACK_BRIEFING.to_string(), reason),
        };
        match self.completion(BRIEFING_PROMPT, &bullet_list(&headlines)).await {
            Ok(text) => Assessed::Computed(text),
            Err(reason) => Assessed::fallback(FALLBACK_BRIEFING.to_string(), reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
