//! Full scan passes through the real sentiment oracle.

use crate::fakes::*;
use sentinel::engine::scanner::ReportLine;
use sentinel::types::{AlertDecision, ScanMode};

const CALM: &[&str] = &["ETF volume at record", "Fed minutes due", "Miners upgrade rigs"];
const SCARY: &[&str] = &["Bridge hack drains $80M", "Fed minutes due", "ETF volume at record"];

fn market() -> StaticMarket {
    StaticMarket::default()
        .with("BTC-USD", oversold())
        .with("ETH-USD", overbought())
        .with("SOL-USD", neutral())
        .with("XRP-USD", vec![0.5; 10])
}

#[tokio::test]
async fn scheduled_pass_alerts_only() {
    let bot = build_bot(market(), StaticHeadlines::new(CALM), KeywordLlm::online());

    let report = bot.scanner.run_pass(ScanMode::Scheduled).await;

    // POSITIVE + NEUTRAL + NEUTRAL → 2/3.
    assert!((report.sentiment.score - 2.0 / 3.0).abs() < 1e-10);

    let sent = bot.chat.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent[0],
        "🚨 BUY ALERT: BTC-USD is cheap!\n📉 RSI: 25.00\n🎯 Confidence: 50%\n💬 ETF flows are doing the heavy lifting."
    );
    assert_eq!(
        sent[1],
        "🚨 SELL ALERT: ETH-USD is expensive!\n📈 RSI: 75.00\n💬 ETF flows are doing the heavy lifting."
    );
    assert_eq!(report.alerts_sent, 2);
}

#[tokio::test]
async fn negative_headline_blocks_buy_but_not_sell() {
    let bot = build_bot(market(), StaticHeadlines::new(SCARY), KeywordLlm::online());

    let report = bot.scanner.run_pass(ScanMode::Scheduled).await;

    let sent = bot.chat.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("🚨 SELL ALERT: ETH-USD"));
    assert!(matches!(
        report.decisions[0],
        AlertDecision::None { ref ticker, .. } if ticker == "BTC-USD"
    ));
}

#[tokio::test]
async fn manual_pass_reports_every_ticker() {
    let bot = build_bot(market(), StaticHeadlines::new(CALM), KeywordLlm::online());

    let report = bot.scanner.run_pass(ScanMode::Manual).await;

    let sent = bot.chat.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(
        sent[2],
        "📊 Manual Market Report\n\
         🟢 BTC-USD: RSI 25.00\n\
         🔴 ETH-USD: RSI 75.00\n\
         ⚪ SOL-USD: RSI 50.00\n\
         ⚠️ XRP-USD: RSI failed (not enough data)"
    );
    assert!(matches!(report.lines[3], ReportLine::Failed { .. }));
}

#[tokio::test]
async fn missing_ticker_does_not_stop_the_pass() {
    let market = StaticMarket::default().with("XRP-USD", overbought());
    let bot = build_bot(market, StaticHeadlines::new(CALM), KeywordLlm::online());

    let report = bot.scanner.run_pass(ScanMode::Manual).await;

    let unavailable = report
        .lines
        .iter()
        .filter(|l| matches!(l, ReportLine::Unavailable { .. }))
        .count();
    assert_eq!(unavailable, 3);
    assert!(bot.chat.sent()[0].starts_with("🚨 SELL ALERT: XRP-USD"));
}

#[tokio::test]
async fn dead_ai_still_alerts_with_defaults() {
    let bot = build_bot(market(), StaticHeadlines::new(SCARY), KeywordLlm::offline());

    let report = bot.scanner.run_pass(ScanMode::Scheduled).await;

    // Every classification falls back to NEUTRAL, so the hack headline
    // cannot block the BUY and the score sits at 0.5.
    assert_eq!(report.sentiment.score, 0.5);
    let sent = bot.chat.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains("Confidence: 37%"));
    assert!(sent[0].ends_with("💬 Market is showing typical volatility."));
}

#[tokio::test]
async fn dead_news_feed_scores_neutral() {
    let bot = build_bot(market(), StaticHeadlines::down(), KeywordLlm::online());

    let report = bot.scanner.run_pass(ScanMode::Scheduled).await;

    assert_eq!(report.sentiment.score, 0.5);
    assert!(report.sentiment.labels.is_empty());
    assert_eq!(report.alerts_sent, 2);
}
