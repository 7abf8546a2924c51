//! News headline provider.
//!
//! Pulls the newest item titles from a crypto news RSS feed. Headlines feed
//! the sentiment classifier, the market-move commentary, and the daily
//! briefing. Nothing is cached: every caller gets a fresh fetch.
//!
//! Default feed: `https://cointelegraph.com/rss`

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rss::Channel;
use tracing::{debug, warn};

use super::HeadlineSource;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Extract up to `limit` non-empty item titles, in feed order.
fn parse_headlines(body: &[u8], limit: usize) -> Result<Vec<String>> {
    let channel = Channel::read_from(body).context("Failed to parse RSS feed")?;
    let headlines = channel
        .items()
        .iter()
        .filter_map(|item| item.title())
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .take(limit)
        .collect();
    Ok(headlines)
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

pub struct RssHeadlines {
    http: Client,
    feed_url: String,
}

impl RssHeadlines {
    pub fn new(feed_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("SENTINEL/0.1.0")
            .build()
            .context("Failed to build news HTTP client")?;
        Ok(Self {
            http,
            feed_url: feed_url.into(),
        })
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }
}

#[async_trait]
impl HeadlineSource for RssHeadlines {
    async fn latest_headlines(&self, limit: usize) -> Result<Vec<String>> {
        let resp = self
            .http
            .get(&self.feed_url)
            .send()
            .await
            .context("News feed request failed")?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, feed = %self.feed_url, "News feed returned error status");
            anyhow::bail!("News feed error {status}");
        }

        let body = resp.bytes().await.context("Failed to read news feed body")?;
        let headlines = parse_headlines(&body, limit)?;
        debug!(count = headlines.len(), "Headlines fetched");
        Ok(headlines)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
