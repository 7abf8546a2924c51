//! Loop iterations driven end to end: chat in, alerts and replies out.

use std::time::{Duration, Instant};

use crate::fakes::*;
use sentinel::engine::commands::{CHECK_ACK, HELP_TEXT};
use sentinel::engine::runner::{BRIEFING_HEADER, STARTUP_MESSAGE};
use sentinel::types::InboundMessage;

fn quiet_market() -> StaticMarket {
    StaticMarket::default()
        .with("BTC-USD", neutral())
        .with("ETH-USD", neutral())
        .with("SOL-USD", neutral())
        .with("XRP-USD", neutral())
}

#[tokio::test]
async fn command_session() {
    let mut bot = build_bot(
        quiet_market(),
        StaticHeadlines::new(&["ETF volume at record", "Fed minutes due"]),
        KeywordLlm::online(),
    );
    bot.chat.queue(vec![
        InboundMessage::text(101, "/status"),
        InboundMessage::text(102, "/ask Is Leverage Smart?"),
        InboundMessage::text(103, "/ask   "),
        InboundMessage { id: 104, text: None },
        InboundMessage::text(105, "/sentiment"),
        InboundMessage::text(106, "/HELP"),
        InboundMessage::text(107, "thanks!"),
    ]);

    bot.process.iteration(12, Instant::now()).await.unwrap();

    assert_eq!(
        bot.chat.sent(),
        vec![
            "✅ Bot is Online.\n👀 Watching: 4 coins\n⏳ Interval: 3600s".to_string(),
            "About \"Is Leverage Smart?\": zoom out.".to_string(),
            "🧠 Market Sentiment: 75%\n💬 ETF flows are doing the heavy lifting.".to_string(),
            HELP_TEXT.to_string(),
        ]
    );
    assert_eq!(bot.process.state().cursor, Some(108));
}

#[tokio::test]
async fn cursor_follows_highest_id() {
    let mut bot = build_bot(quiet_market(), StaticHeadlines::new(&[]), KeywordLlm::online());
    bot.chat.queue(vec![
        InboundMessage { id: 5, text: None },
        InboundMessage { id: 6, text: None },
        InboundMessage { id: 7, text: None },
    ]);

    let now = Instant::now();
    bot.process.iteration(12, now).await.unwrap();
    bot.process.iteration(12, now).await.unwrap();
    bot.process.iteration(12, now).await.unwrap();

    assert_eq!(bot.chat.cursors(), vec![None, Some(8), Some(8)]);
}

#[tokio::test]
async fn repeated_checks_each_report_once() {
    let mut bot = build_bot(quiet_market(), StaticHeadlines::new(&[]), KeywordLlm::online());
    let start = Instant::now();
    // First iteration runs the initial scheduled pass; nothing to alert.
    bot.process.iteration(12, start).await.unwrap();
    assert!(bot.chat.sent().is_empty());

    bot.chat.queue(vec![
        InboundMessage::text(1, "/check"),
        InboundMessage::text(2, "/check@sentinel_bot"),
    ]);
    bot.process
        .iteration(12, start + Duration::from_secs(2))
        .await
        .unwrap();

    let sent = bot.chat.sent();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0], CHECK_ACK);
    assert!(sent[1].starts_with("📊 Manual Market Report"));
    assert_eq!(sent[2], CHECK_ACK);
    assert!(sent[3].starts_with("📊 Manual Market Report"));
}

#[tokio::test]
async fn scheduled_alerts_repeat_each_interval() {
    let market = quiet_market().with("BTC-USD", overbought());
    let mut bot = build_bot(market, StaticHeadlines::new(&[]), KeywordLlm::online());
    let start = Instant::now();

    bot.process.iteration(12, start).await.unwrap();
    bot.process
        .iteration(12, start + Duration::from_secs(1800))
        .await
        .unwrap();
    bot.process
        .iteration(12, start + Duration::from_secs(3600))
        .await
        .unwrap();

    let sells = bot
        .chat
        .sent()
        .iter()
        .filter(|m| m.starts_with("🚨 SELL ALERT: BTC-USD"))
        .count();
    assert_eq!(sells, 2);
}

#[tokio::test]
async fn daily_briefing_once_per_day() {
    let mut bot = build_bot(
        quiet_market(),
        StaticHeadlines::new(&["ETF volume at record"]),
        KeywordLlm::online(),
    );
    let now = Instant::now();

    for hour in [7, 8, 8, 8, 9, 10] {
        bot.process.iteration(hour, now).await.unwrap();
    }
    // Next day.
    bot.process.iteration(8, now).await.unwrap();

    let briefings: Vec<String> = bot
        .chat
        .sent()
        .into_iter()
        .filter(|m| m.starts_with(BRIEFING_HEADER))
        .collect();
    assert_eq!(briefings.len(), 2);
    assert_eq!(briefings[0], format!("{BRIEFING_HEADER}\n- ETFs\n- Hacks\n- Fed"));
}

#[tokio::test]
async fn briefing_falls_back_when_news_is_down() {
    let mut bot = build_bot(quiet_market(), StaticHeadlines::down(), KeywordLlm::online());
    bot.process.iteration(8, Instant::now()).await.unwrap();
    assert_eq!(
        bot.chat.sent(),
        vec![format!("{BRIEFING_HEADER}\nCheck your charts, headlines are stuck.")]
    );
}

#[tokio::test]
async fn run_until_announces_startup() {
    let mut bot = build_bot(quiet_market(), StaticHeadlines::new(&[]), KeywordLlm::online());
    bot.chat.queue(vec![InboundMessage::text(1, "/status")]);

    bot.process
        .run_until(tokio::time::sleep(Duration::from_millis(50)))
        .await
        .unwrap();

    let sent = bot.chat.sent();
    assert_eq!(sent[0], STARTUP_MESSAGE);
    assert!(sent.iter().any(|m| m.starts_with("✅ Bot is Online.")));
}
