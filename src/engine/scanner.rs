//! Watch-list scanner.
//!
//! One pass walks the watch list in order: fetch hourly bars, compute RSI,
//! place the reading in an icon band, and decide whether to alert. A single
//! sentiment score is taken up front and shared by every ticker in the pass.
//! Failures stay local to their ticker; the pass always finishes.

use anyhow::{bail, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::dashboard::AppState;
use crate::data::MarketDataSource;
use crate::llm::sentiment::Sentiment;
use crate::notify::Notifier;
use crate::strategy::rsi::{series_rsi, DEFAULT_PERIOD};
use crate::strategy::signal::{buy_confidence, RsiBand, Signal, SignalThresholds};
use crate::types::{AlertDecision, ScanMode, SentimentReading};

pub const REPORT_HEADER: &str = "📊 Manual Market Report";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub watchlist: Vec<String>,
    pub thresholds: SignalThresholds,
    pub rsi_period: usize,
}

impl ScanSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            watchlist: config.bot.watchlist.clone(),
            thresholds: config.signals.thresholds(),
            rsi_period: config.signals.rsi_period,
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Pass output
// ---------------------------------------------------------------------------

/// One line of the manual report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportLine {
    Reading {
        ticker: String,
        rsi: f64,
        band: RsiBand,
    },
    /// Price fetch failed or returned no bars.
    Unavailable { ticker: String },
    /// Not enough bars for the RSI period.
    Failed { ticker: String },
    Error { ticker: String, detail: String },
}

impl ReportLine {
    pub fn ticker(&self) -> &str {
        match self {
            ReportLine::Reading { ticker, .. }
            | ReportLine::Unavailable { ticker }
            | ReportLine::Failed { ticker }
            | ReportLine::Error { ticker, .. } => ticker,
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLine::Reading { ticker, rsi, band } => {
                write!(f, "{} {ticker}: RSI {rsi:.2}", band.icon())
            }
            ReportLine::Unavailable { ticker } => write!(f, "⚠️ {ticker}: data unavailable"),
            ReportLine::Failed { ticker } => write!(f, "⚠️ {ticker}: RSI failed (not enough data)"),
            ReportLine::Error { ticker, .. } => write!(f, "❌ {ticker}: error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub mode: ScanMode,
    pub sentiment: SentimentReading,
    pub lines: Vec<ReportLine>,
    pub decisions: Vec<AlertDecision>,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
}

impl ScanReport {
    fn new(mode: ScanMode, sentiment: SentimentReading) -> Self {
        Self {
            mode,
            sentiment,
            lines: Vec::new(),
            decisions: Vec::new(),
            alerts_sent: 0,
            alerts_failed: 0,
        }
    }

    /// The multi-line summary sent for manual passes.
    pub fn message(&self) -> String {
        let mut text = String::from(REPORT_HEADER);
        for line in &self.lines {
            text.push('\n');
            text.push_str(&line.to_string());
        }
        text
    }

    pub fn alerts(&self) -> impl Iterator<Item = &AlertDecision> {
        self.decisions.iter().filter(|d| d.is_alert())
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct ScanController {
    market: Arc<dyn MarketDataSource>,
    sentiment: Arc<dyn Sentiment>,
    notifier: Arc<dyn Notifier>,
    settings: ScanSettings,
    status: Option<AppState>,
}

impl ScanController {
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        sentiment: Arc<dyn Sentiment>,
        notifier: Arc<dyn Notifier>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            market,
            sentiment,
            notifier,
            settings,
            status: None,
        }
    }

    /// Publish pass counters to the liveness server.
    pub fn with_status(mut self, status: AppState) -> Self {
        self.status = Some(status);
        self
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Run one pass over the watch list.
    pub async fn run_pass(&self, mode: ScanMode) -> ScanReport {
        info!(%mode, tickers = self.settings.watchlist.len(), "Scan pass starting");

        let assessed = self.sentiment.score().await;
        if let Some(reason) = assessed.fallback_reason() {
            warn!(%reason, "Sentiment unavailable, scoring at neutral");
        }
        let mut report = ScanReport::new(mode, assessed.into_value());
        let score = report.sentiment.score;

        for ticker in &self.settings.watchlist {
            let (line, decision) = match self.evaluate(ticker, score).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "Ticker evaluation failed");
                    let line = ReportLine::Error {
                        ticker: ticker.clone(),
                        detail: e.to_string(),
                    };
                    (line, None)
                }
            };
            debug!(line = %line, "Report line");
            report.lines.push(line);

            let Some(decision) = decision else { continue };
            if let Some(message) = decision.message() {
                if self.notifier.send(&message).await {
                    info!(decision = %decision, "Alert sent");
                    report.alerts_sent += 1;
                } else {
                    warn!(decision = %decision, "Alert not delivered");
                    report.alerts_failed += 1;
                }
            }
            report.decisions.push(decision);
        }

        if mode == ScanMode::Manual && !self.notifier.send(&report.message()).await {
            warn!("Manual report not delivered");
        }

        if let Some(status) = &self.status {
            status
                .bot
                .write()
                .await
                .record_scan(report.alerts_sent, report.alerts_failed, score);
        }

        info!(
            %mode,
            sentiment = %report.sentiment,
            alerts_sent = report.alerts_sent,
            alerts_failed = report.alerts_failed,
            "Scan pass complete"
        );
        report
    }

    async fn evaluate(
        &self,
        ticker: &str,
        score: f64,
    ) -> Result<(ReportLine, Option<AlertDecision>)> {
        let series = match self.market.fetch_series(ticker).await {
            Ok(s) if !s.is_empty() => s,
            Ok(_) => {
                warn!(ticker, "No price data returned");
                return Ok((unavailable(ticker), None));
            }
            Err(e) => {
                warn!(ticker, error = %e, "Price fetch failed");
                return Ok((unavailable(ticker), None));
            }
        };

        let period = if self.settings.rsi_period == 0 {
            DEFAULT_PERIOD
        } else {
            self.settings.rsi_period
        };
        let Some(rsi) = series_rsi(&series, period) else {
            warn!(ticker, bars = series.len(), period, "Series too short for RSI");
            return Ok((
                ReportLine::Failed {
                    ticker: ticker.to_string(),
                },
                None,
            ));
        };
        if !rsi.is_finite() {
            bail!("non-finite RSI for {ticker}");
        }

        let line = ReportLine::Reading {
            ticker: ticker.to_string(),
            rsi,
            band: self.settings.thresholds.band(rsi),
        };
        let decision = self.decide(ticker, rsi, score).await;
        Ok((line, Some(decision)))
    }

    async fn decide(&self, ticker: &str, rsi: f64, score: f64) -> AlertDecision {
        let ticker = ticker.to_string();
        match self.settings.thresholds.signal(rsi) {
            Signal::BuyCandidate => {
                let safe = self.sentiment.is_safe().await;
                if !*safe.value() {
                    info!(ticker = %ticker, rsi, "BUY suppressed: negative headlines");
                    return AlertDecision::None { ticker, rsi };
                }
                let reason = self.sentiment.reason().await.into_value();
                AlertDecision::Buy {
                    confidence: buy_confidence(rsi, score),
                    ticker,
                    rsi,
                    reason,
                }
            }
            Signal::Sell => {
                let reason = self.sentiment.reason().await.into_value();
                AlertDecision::Sell { ticker, rsi, reason }
            }
            Signal::Hold => AlertDecision::None { ticker, rsi },
        }
    }
}

fn unavailable(ticker: &str) -> ReportLine {
    ReportLine::Unavailable {
        ticker: ticker.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
