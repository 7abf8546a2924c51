//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has built-in defaults, so a missing file (or a partial one) still
//! yields a working configuration. Secrets (API keys, chat tokens) are
//! referenced by env-var name and resolved at runtime.

use anyhow::{bail, Context, Result};
use secrecy::Secret;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::strategy::signal::SignalThresholds;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub signals: SignalConfig,
    pub market_data: MarketDataConfig,
    pub llm: LlmConfig,
    pub news: NewsConfig,
    pub telegram: TelegramConfig,
    pub liveness: LivenessConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BotConfig {
    pub name: String,
    /// Tickers scanned each pass, in order.
    pub watchlist: Vec<String>,
    pub scan_interval_secs: u64,
    pub poll_interval_secs: u64,
    /// Pause after an iteration fails before the loop resumes.
    pub error_pause_secs: u64,
    pub briefing_enabled: bool,
    /// Local hour (0–23) for the daily briefing.
    pub briefing_hour: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "SENTINEL".to_string(),
            watchlist: ["BTC-USD", "ETH-USD", "SOL-USD", "XRP-USD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            scan_interval_secs: 3600,
            poll_interval_secs: 2,
            error_pause_secs: 5,
            briefing_enabled: true,
            briefing_hour: 8,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SignalConfig {
    pub rsi_period: usize,
    pub buy_below: f64,
    pub sell_above: f64,
    pub oversold_below: f64,
    pub overbought_above: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        let t = SignalThresholds::default();
        Self {
            rsi_period: crate::strategy::rsi::DEFAULT_PERIOD,
            buy_below: t.buy_below,
            sell_above: t.sell_above,
            oversold_below: t.oversold_below,
            overbought_above: t.overbought_above,
        }
    }
}

impl SignalConfig {
    pub fn thresholds(&self) -> SignalThresholds {
        SignalThresholds {
            buy_below: self.buy_below,
            sell_above: self.sell_above,
            oversold_below: self.oversold_below,
            overbought_above: self.overbought_above,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MarketDataConfig {
    /// Lookback window in provider notation, e.g. "7d".
    pub range: String,
    /// Bar size in provider notation, e.g. "1h".
    pub interval: String,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            range: "7d".to_string(),
            interval: "1h".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_key_env: String,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "google/gemma-3-27b-it:free".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            max_tokens: 256,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NewsConfig {
    pub feed_url: String,
    /// How many of the newest headlines feed each sentiment call.
    pub headline_limit: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://cointelegraph.com/rss".to_string(),
            headline_limit: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token_env: String,
    pub chat_id_env: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: "TELEGRAM_TOKEN".to_string(),
            chat_id_env: "TELEGRAM_CHAT_ID".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LivenessConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
        }
    }
}

impl LivenessConfig {
    /// Hosting platforms announce the port to bind through `PORT`.
    pub fn effective_port(&self) -> u16 {
        std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(self.port)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise use the built-in defaults.
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file found, using built-in defaults");
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the scan loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.bot.watchlist.is_empty() {
            bail!("bot.watchlist must name at least one ticker");
        }
        if self.bot.scan_interval_secs == 0 {
            bail!("bot.scan_interval_secs must be positive");
        }
        if self.bot.briefing_hour > 23 {
            bail!("bot.briefing_hour must be 0-23, got {}", self.bot.briefing_hour);
        }
        let s = &self.signals;
        if s.rsi_period < 2 {
            bail!("signals.rsi_period must be at least 2, got {}", s.rsi_period);
        }
        if s.buy_below >= s.sell_above {
            bail!(
                "signals.buy_below ({}) must be below signals.sell_above ({})",
                s.buy_below,
                s.sell_above
            );
        }
        if s.oversold_below > s.overbought_above {
            bail!(
                "signals.oversold_below ({}) must not exceed signals.overbought_above ({})",
                s.oversold_below,
                s.overbought_above
            );
        }
        if self.news.headline_limit == 0 {
            bail!("news.headline_limit must be positive");
        }
        Ok(())
    }

    /// Briefing hour, or `None` when the briefing is switched off.
    pub fn briefing_hour(&self) -> Option<u32> {
        self.bot.briefing_enabled.then_some(self.bot.briefing_hour)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.bot.scan_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.bot.poll_interval_secs)
    }

    pub fn error_pause(&self) -> Duration {
        Duration::from_secs(self.bot.error_pause_secs)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Like [`resolve_env`](Self::resolve_env) but wraps the value so it
    /// never ends up in logs. Empty values count as unset.
    pub fn resolve_secret(env_name: &str) -> Option<Secret<String>> {
        Self::resolve_env(env_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(Secret::new)
    }
}
