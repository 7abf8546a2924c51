//! External data sources.
//!
//! Defines the `MarketDataSource` and `HeadlineSource` traits and provides
//! implementations backed by the Yahoo Finance chart API and an RSS news feed.

pub mod market;
pub mod news;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::PriceSeries;

/// Historical price provider.
///
/// Implementors return a time-ordered series for one ticker. An empty series
/// is a valid answer (the scanner reports the ticker as unavailable).
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_series(&self, ticker: &str) -> Result<PriceSeries>;
}

/// News headline provider. Called fresh every time; no caching.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    /// Up to `limit` of the newest headlines, newest first.
    async fn latest_headlines(&self, limit: usize) -> Result<Vec<String>>;
}
