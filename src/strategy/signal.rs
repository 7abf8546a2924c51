//! RSI thresholds: report bands, alert signals, and BUY confidence.

use std::fmt;

/// Fixed RSI cut-offs. Alert thresholds are stricter than the report-icon
/// bands, so a ticker can show as oversold in the report without alerting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalThresholds {
    /// RSI strictly below this is a BUY candidate.
    pub buy_below: f64,
    /// RSI strictly above this triggers a SELL alert.
    pub sell_above: f64,
    /// RSI strictly below this gets the oversold icon.
    pub oversold_below: f64,
    /// RSI strictly above this gets the overbought icon.
    pub overbought_above: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            buy_below: 30.0,
            sell_above: 70.0,
            oversold_below: 35.0,
            overbought_above: 65.0,
        }
    }
}

/// Visual classification of an RSI reading for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiBand {
    Oversold,
    Neutral,
    Overbought,
}

impl RsiBand {
    pub fn icon(&self) -> &'static str {
        match self {
            RsiBand::Oversold => "🟢",
            RsiBand::Neutral => "⚪",
            RsiBand::Overbought => "🔴",
        }
    }
}

impl fmt::Display for RsiBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsiBand::Oversold => write!(f, "oversold"),
            RsiBand::Neutral => write!(f, "neutral"),
            RsiBand::Overbought => write!(f, "overbought"),
        }
    }
}

/// What the thresholds say about a reading, before sentiment is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Oversold enough to buy, pending a news safety check.
    BuyCandidate,
    Sell,
    Hold,
}

impl SignalThresholds {
    pub fn band(&self, rsi: f64) -> RsiBand {
        if rsi < self.oversold_below {
            RsiBand::Oversold
        } else if rsi > self.overbought_above {
            RsiBand::Overbought
        } else {
            RsiBand::Neutral
        }
    }

    pub fn signal(&self, rsi: f64) -> Signal {
        if rsi < self.buy_below {
            Signal::BuyCandidate
        } else if rsi > self.sell_above {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

/// BUY confidence as a whole percentage: `(1 - rsi/100) * score * 100`,
/// rounded down.
pub fn buy_confidence(rsi: f64, sentiment_score: f64) -> u32 {
    let raw = (1.0 - rsi / 100.0) * sentiment_score.clamp(0.0, 1.0) * 100.0;
    // Nudge before flooring so 59.99999999 from float error still reads 60.
    (raw + 1e-9).floor().clamp(0.0, 100.0) as u32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
