//! Signal logic: the RSI indicator and the thresholds that turn a reading
//! into an alert.

pub mod rsi;
pub mod signal;
