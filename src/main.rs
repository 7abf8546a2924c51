//! SENTINEL: RSI + news-sentiment crypto watch bot.
//!
//! Entry point. Initialises structured logging, loads configuration, wires
//! market data, the sentiment oracle and Telegram together, starts the
//! liveness server, and runs the process loop until Ctrl+C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use sentinel::config::AppConfig;
use sentinel::dashboard::{self, BotStatus, DashboardState};
use sentinel::data::market::YahooChartClient;
use sentinel::data::news::RssHeadlines;
use sentinel::engine::commands::CommandRouter;
use sentinel::engine::runner::{LoopSettings, ProcessLoop};
use sentinel::engine::scanner::{ScanController, ScanSettings};
use sentinel::llm::openrouter::OpenRouterClient;
use sentinel::llm::sentiment::SentimentOracle;
use sentinel::notify::telegram::TelegramClient;

const BANNER: &str = r#"
 ____  _____ _   _ _____ ___ _   _ _____ _
/ ___|| ____| \ | |_   _|_ _| \ | | ____| |
\___ \|  _| |  \| | | |  | ||  \| |  _| | |
 ___) | |___| |\  | | |  | || |\  | |___| |___
|____/|_____|_| \_| |_| |___|_| \_|_____|_____|

  RSI + news-sentiment crypto watch
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cfg = AppConfig::load_or_default("config.toml")?;

    println!("{BANNER}");
    info!(
        name = %cfg.bot.name,
        watchlist = ?cfg.bot.watchlist,
        scan_interval_secs = cfg.bot.scan_interval_secs,
        briefing_hour = ?cfg.briefing_hour(),
        "SENTINEL starting up"
    );

    // -- Chat transport --------------------------------------------------

    let token = AppConfig::resolve_secret(&cfg.telegram.bot_token_env).with_context(|| {
        format!("Telegram bot token missing: set {}", cfg.telegram.bot_token_env)
    })?;
    let chat_id = AppConfig::resolve_env(&cfg.telegram.chat_id_env)?;
    let notifier = Arc::new(TelegramClient::new(token, chat_id)?);

    // -- Data + AI -------------------------------------------------------

    let market = Arc::new(YahooChartClient::new(&cfg.market_data)?);
    let headlines = Arc::new(RssHeadlines::new(cfg.news.feed_url.clone())?);

    let llm_key = AppConfig::resolve_secret(&cfg.llm.api_key_env);
    if llm_key.is_none() {
        warn!(
            env = %cfg.llm.api_key_env,
            "No LLM API key configured; sentiment will use neutral defaults"
        );
    }
    let llm = Arc::new(OpenRouterClient::from_config(&cfg.llm, llm_key)?);
    info!(model = %cfg.llm.model, feed = %headlines.feed_url(), "Sentiment oracle ready");

    let sentiment = Arc::new(
        SentimentOracle::new(llm, headlines).with_headline_limit(cfg.news.headline_limit),
    );

    // -- Liveness --------------------------------------------------------

    let status = Arc::new(DashboardState::new(BotStatus::new(
        cfg.bot.name.clone(),
        cfg.bot.watchlist.clone(),
        cfg.bot.scan_interval_secs,
    )));
    if cfg.liveness.enabled {
        dashboard::spawn_dashboard(status.clone(), cfg.liveness.effective_port());
    }

    // -- Engine ----------------------------------------------------------

    let scanner = Arc::new(
        ScanController::new(
            market,
            sentiment.clone(),
            notifier.clone(),
            ScanSettings::from_config(&cfg),
        )
        .with_status(status.clone()),
    );
    let router = CommandRouter::new(
        scanner.clone(),
        sentiment.clone(),
        notifier.clone(),
        cfg.scan_interval(),
    )
    .with_status(status);

    let mut process = ProcessLoop::new(
        notifier,
        sentiment,
        scanner,
        router,
        LoopSettings::from_config(&cfg),
    );

    info!("Entering main loop. Press Ctrl+C to stop.");
    process.run().await?;

    info!("SENTINEL shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sentinel=info"));

    let json_logging = std::env::var("SENTINEL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
