//! Relative Strength Index (Wilder).
//!
//! Averages are seeded with the simple mean of the first `period` gains and
//! losses, then Wilder-smoothed through the remainder of the series. Only
//! close prices are used.

use crate::types::PriceSeries;

/// Standard RSI lookback.
pub const DEFAULT_PERIOD: usize = 14;

/// RSI for the most recent close.
///
/// Returns `None` when there are fewer than `period + 1` closes (not enough
/// price changes to seed the averages) or when `period` is zero. A window
/// with no losses, including a completely flat one, reads 100.
pub fn compute_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let p = period as f64;

    let (gain_sum, loss_sum) = closes[..=period]
        .windows(2)
        .map(|w| split_change(w[1] - w[0]))
        .fold((0.0, 0.0), |(g, l), (dg, dl)| (g + dg, l + dl));

    let mut avg_gain = gain_sum / p;
    let mut avg_loss = loss_sum / p;

    for w in closes[period..].windows(2) {
        let (gain, loss) = split_change(w[1] - w[0]);
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
    }

    Some(rsi_from_averages(avg_gain, avg_loss))
}

/// RSI of a fetched series' close prices.
pub fn series_rsi(series: &PriceSeries, period: usize) -> Option<f64> {
    compute_rsi(&series.closes(), period)
}

fn split_change(delta: f64) -> (f64, f64) {
    if delta > 0.0 {
        (delta, 0.0)
    } else {
        (0.0, -delta)
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
