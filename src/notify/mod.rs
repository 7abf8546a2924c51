//! Chat transport: outbound alerts and inbound command polling.

pub mod telegram;

use async_trait::async_trait;

use crate::types::InboundMessage;

/// Bidirectional chat channel bound to a single conversation.
///
/// Both operations swallow transport errors: `send` reports delivery as a
/// bool and `poll` returns an empty batch, so the process loop never dies on
/// a flaky network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one plain-text message. Returns `true` if the API accepted it.
    async fn send(&self, text: &str) -> bool;

    /// Fetch inbound messages with id `>= cursor`, oldest first.
    async fn poll(&self, cursor: Option<i64>) -> Vec<InboundMessage>;
}
