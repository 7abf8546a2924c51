//! SENTINEL: RSI + news-sentiment crypto watch bot.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod data;
pub mod llm;
pub mod strategy;
pub mod notify;
pub mod engine;
pub mod dashboard;
