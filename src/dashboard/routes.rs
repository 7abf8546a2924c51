//! Liveness API route handlers.
//!
//! State is shared via `Arc<DashboardState>`; the process loop writes, the
//! handlers only read.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Running counters for the bot, updated after each pass and command.
#[derive(Debug, Clone)]
pub struct BotStatus {
    pub name: String,
    pub watchlist: Vec<String>,
    pub scan_interval_secs: u64,
    pub start_time: DateTime<Utc>,
    pub scans_completed: u64,
    pub commands_handled: u64,
    pub alerts_delivered: u64,
    pub alerts_failed: u64,
    pub last_scan: Option<DateTime<Utc>>,
    pub last_sentiment: Option<f64>,
}

impl BotStatus {
    pub fn new(name: impl Into<String>, watchlist: Vec<String>, scan_interval_secs: u64) -> Self {
        Self {
            name: name.into(),
            watchlist,
            scan_interval_secs,
            start_time: Utc::now(),
            scans_completed: 0,
            commands_handled: 0,
            alerts_delivered: 0,
            alerts_failed: 0,
            last_scan: None,
            last_sentiment: None,
        }
    }

    pub fn record_scan(&mut self, alerts_delivered: usize, alerts_failed: usize, sentiment: f64) {
        self.scans_completed += 1;
        self.alerts_delivered += alerts_delivered as u64;
        self.alerts_failed += alerts_failed as u64;
        self.last_scan = Some(Utc::now());
        self.last_sentiment = Some(sentiment);
    }

    pub fn record_command(&mut self) {
        self.commands_handled += 1;
    }
}

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub bot: RwLock<BotStatus>,
}

impl DashboardState {
    pub fn new(initial: BotStatus) -> Self {
        Self {
            bot: RwLock::new(initial),
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub watchlist: Vec<String>,
    pub scan_interval_secs: u64,
    pub scans_completed: u64,
    pub commands_handled: u64,
    pub alerts_delivered: u64,
    pub alerts_failed: u64,
    pub last_scan: Option<String>,
    pub last_sentiment_pct: Option<u32>,
    pub uptime_secs: i64,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /
pub async fn alive() -> &'static str {
    "I am alive"
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let bot = state.bot.read().await;
    Json(StatusResponse {
        name: bot.name.clone(),
        watchlist: bot.watchlist.clone(),
        scan_interval_secs: bot.scan_interval_secs,
        scans_completed: bot.scans_completed,
        commands_handled: bot.commands_handled,
        alerts_delivered: bot.alerts_delivered,
        alerts_failed: bot.alerts_failed,
        last_scan: bot.last_scan.map(|t| t.to_rfc3339()),
        last_sentiment_pct: bot.last_sentiment.map(|s| (s * 100.0).round() as u32),
        uptime_secs: (Utc::now() - bot.start_time).num_seconds(),
    })
}
