//! The cooperative process loop.
//!
//! Each iteration drains inbound chat commands, fires the daily briefing
//! when its hour comes round, and runs a scheduled scan once the interval
//! has elapsed. Everything is awaited in sequence; a slow upstream simply
//! delays the next iteration.

use anyhow::{Context, Result};
use chrono::{Local, Timelike};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::commands::CommandRouter;
use super::scanner::ScanController;
use crate::config::AppConfig;
use crate::llm::sentiment::Sentiment;
use crate::notify::Notifier;
use crate::types::{InboundMessage, ScanMode};

pub const STARTUP_MESSAGE: &str = "🤖 System Online. Send /help for commands.";

pub const BRIEFING_HEADER: &str = "☀️ Daily Briefing";

// ---------------------------------------------------------------------------
// Loop state
// ---------------------------------------------------------------------------

/// Everything that survives from one iteration to the next.
#[derive(Debug, Clone, Default)]
pub struct LoopState {
    /// Next inbound message id to request; `None` until the first message.
    pub cursor: Option<i64>,
    pub last_scan: Option<Instant>,
    pub briefing_sent: bool,
}

impl LoopState {
    /// Move the cursor past the highest id in `messages`. Never moves back.
    pub fn advance_cursor(&mut self, messages: &[InboundMessage]) -> Result<()> {
        let Some(max) = messages.iter().map(|m| m.id).max() else {
            return Ok(());
        };
        let next = max.checked_add(1).context("inbound message id overflow")?;
        self.cursor = Some(self.cursor.map_or(next, |c| c.max(next)));
        Ok(())
    }

    /// Whether the briefing should go out now. Leaving the briefing hour
    /// re-arms the flag for the next day.
    pub fn briefing_due(&mut self, hour: u32, briefing_hour: Option<u32>) -> bool {
        match briefing_hour {
            Some(h) if h == hour => !self.briefing_sent,
            Some(_) => {
                self.briefing_sent = false;
                false
            }
            None => false,
        }
    }

    pub fn mark_briefed(&mut self) {
        self.briefing_sent = true;
    }

    pub fn scan_due(&self, now: Instant, interval: Duration) -> bool {
        self.last_scan
            .map_or(true, |last| now.saturating_duration_since(last) >= interval)
    }

    pub fn mark_scanned(&mut self, now: Instant) {
        self.last_scan = Some(now);
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub scan_interval: Duration,
    pub poll_interval: Duration,
    pub error_pause: Duration,
    pub briefing_hour: Option<u32>,
}

impl LoopSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            scan_interval: config.scan_interval(),
            poll_interval: config.poll_interval(),
            error_pause: config.error_pause(),
            briefing_hour: config.briefing_hour(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

pub struct ProcessLoop {
    notifier: Arc<dyn Notifier>,
    sentiment: Arc<dyn Sentiment>,
    scanner: Arc<ScanController>,
    router: CommandRouter,
    settings: LoopSettings,
    state: LoopState,
}

impl ProcessLoop {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        sentiment: Arc<dyn Sentiment>,
        scanner: Arc<ScanController>,
        router: CommandRouter,
        settings: LoopSettings,
    ) -> Self {
        Self {
            notifier,
            sentiment,
            scanner,
            router,
            settings,
            state: LoopState::default(),
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// One pass of the loop body at local hour `hour` and time `now`.
    pub async fn iteration(&mut self, hour: u32, now: Instant) -> Result<()> {
        let messages = self.notifier.poll(self.state.cursor).await;
        self.state.advance_cursor(&messages)?;

        for message in &messages {
            match &message.text {
                Some(text) => {
                    info!(id = message.id, text = %text, "Received");
                    self.router.handle_text(text).await;
                }
                None => debug!(id = message.id, "Skipping non-text or foreign update"),
            }
        }

        if self.state.briefing_due(hour, self.settings.briefing_hour) {
            self.send_briefing().await;
            self.state.mark_briefed();
        }

        if self.state.scan_due(now, self.settings.scan_interval) {
            self.scanner.run_pass(ScanMode::Scheduled).await;
            self.state.mark_scanned(now);
        }

        Ok(())
    }

    async fn send_briefing(&self) {
        let briefing = self.sentiment.briefing().await;
        if let Some(reason) = briefing.fallback_reason() {
            warn!(%reason, "Briefing fell back to default text");
        }
        let text = format!("{BRIEFING_HEADER}\n{}", briefing.value());
        if self.notifier.send(&text).await {
            info!("Daily briefing sent");
        }
    }

    /// Run until Ctrl+C.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for interrupt");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` resolves. Iteration errors are logged and
    /// followed by a short pause; they never end the loop.
    pub async fn run_until(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);

        info!(
            scan_interval_secs = self.settings.scan_interval.as_secs(),
            briefing_hour = ?self.settings.briefing_hour,
            "Process loop starting"
        );
        self.notifier.send(STARTUP_MESSAGE).await;

        loop {
            let hour = Local::now().hour();

            let pause = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = self.iteration(hour, Instant::now()) => match result {
                    Ok(()) => self.settings.poll_interval,
                    Err(e) => {
                        error!(error = %e, "Loop iteration failed");
                        self.settings.error_pause
                    }
                },
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!("Process loop stopped");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
