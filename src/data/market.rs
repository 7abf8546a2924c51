//! Yahoo Finance chart API client.
//!
//! Fetches hourly OHLCV bars for crypto pairs such as `BTC-USD`.
//!
//! API: `https://query1.finance.yahoo.com/v8/finance/chart/{ticker}?range=7d&interval=1h`
//! Auth: none. Requests without a browser-like user agent are often refused.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::MarketDataSource;
use crate::config::MarketDataConfig;
use crate::types::{PriceBar, PriceSeries};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

const USER_AGENT: &str = "Mozilla/5.0 (compatible; SENTINEL/0.1)";

// ---------------------------------------------------------------------------
// API response types (Yahoo JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    /// Bar open times, unix seconds.
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

/// Parallel arrays, one entry per timestamp. Gaps come through as `null`.
#[derive(Debug, Deserialize, Default)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Convert a chart response body into a series. Bars without a close are
/// dropped; missing open/high/low fall back to the close.
fn parse_chart(ticker: &str, body: &str) -> Result<PriceSeries> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).context("Failed to parse Yahoo chart response")?;

    if let Some(err) = envelope.chart.error {
        bail!("Yahoo chart error for {ticker}: {} ({})", err.code, err.description);
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        bail!("Yahoo chart response for {ticker} has no result");
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

    let mut bars: Vec<PriceBar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = at(&quote.close, i)?;
            let timestamp = Utc.timestamp_opt(ts, 0).single()?;
            Some(PriceBar {
                timestamp,
                open: at(&quote.open, i).unwrap_or(close),
                high: at(&quote.high, i).unwrap_or(close),
                low: at(&quote.low, i).unwrap_or(close),
                close,
                volume: at(&quote.volume, i).map(|v| v.max(0.0) as u64).unwrap_or(0),
            })
        })
        .collect();

    let dropped = result.timestamp.len() - bars.len();
    if dropped > 0 {
        debug!(ticker, dropped, "Skipped bars with no close price");
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(PriceSeries::new(ticker, bars))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct YahooChartClient {
    http: Client,
    base_url: String,
    range: String,
    interval: String,
}

impl YahooChartClient {
    pub fn new(config: &MarketDataConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build market data HTTP client")?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            range: config.range.clone(),
            interval: config.interval.clone(),
        })
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!(
            "{}/{}?range={}&interval={}",
            self.base_url,
            urlencoding::encode(ticker),
            urlencoding::encode(&self.range),
            urlencoding::encode(&self.interval),
        )
    }
}

#[async_trait]
impl MarketDataSource for YahooChartClient {
    async fn fetch_series(&self, ticker: &str) -> Result<PriceSeries> {
        let url = self.chart_url(ticker);
        debug!(ticker, %url, "Fetching price history");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Chart request failed for {ticker}"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("Failed to read chart body for {ticker}"))?;

        if !status.is_success() {
            warn!(ticker, %status, "Yahoo chart API returned error status");
            bail!("Yahoo chart API error {status} for {ticker}");
        }

        let series = parse_chart(ticker, &body)?;
        debug!(series = %series, "Price history fetched");
        Ok(series)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
