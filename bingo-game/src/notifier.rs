//! Chat transport seam. The game only needs to post, edit and delete text.

use crate::Result;
use async_trait::async_trait;
use bingo_core::PlayerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chat {
    /// Public group where rounds are announced.
    Group,
    Player(PlayerId),
    /// Administrative channel for operator-facing errors.
    Operator,
}

impl fmt::Display for Chat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => f.write_str("group"),
            Self::Player(id) => write!(f, "player {}", id),
            Self::Operator => f.write_str("operator"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat: Chat,
    pub message_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextFormat {
    Markdown,
    MarkdownV2,
}

/// Outbound chat side effects. Failures are reported back but the game never
/// retries them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post_to_group(&self, text: &str) -> Result<MessageRef>;

    async fn send_direct(&self, player: PlayerId, text: &str) -> Result<MessageRef>;

    async fn edit_message(&self, message: &MessageRef, text: &str, format: TextFormat)
        -> Result<()>;

    async fn delete_message(&self, message: &MessageRef) -> Result<()>;

    /// Route an error to the operator channel.
    async fn report_error(&self, text: &str);

    /// How a player is referred to in group messages.
    fn mention(&self, player: PlayerId) -> String {
        format!("player {}", player)
    }
}

/// Notifier that writes every chat side effect to the log.
#[derive(Debug, Default)]
pub struct LogNotifier {
    next_id: AtomicI64,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn message(&self, chat: Chat) -> MessageRef {
        MessageRef {
            chat,
            message_id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn post_to_group(&self, text: &str) -> Result<MessageRef> {
        let message = self.message(Chat::Group);
        tracing::info!("[group #{}]\n{}", message.message_id, text);
        Ok(message)
    }

    async fn send_direct(&self, player: PlayerId, text: &str) -> Result<MessageRef> {
        let message = self.message(Chat::Player(player));
        tracing::info!("[player {} #{}]\n{}", player, message.message_id, text);
        Ok(message)
    }

    async fn edit_message(
        &self,
        message: &MessageRef,
        text: &str,
        _format: TextFormat,
    ) -> Result<()> {
        tracing::info!("[{} #{} edited]\n{}", message.chat, message.message_id, text);
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<()> {
        tracing::info!("[{} #{} deleted]", message.chat, message.message_id);
        Ok(())
    }

    async fn report_error(&self, text: &str) {
        tracing::warn!("[operator] ⛔️ {}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_assigns_ids() {
        let notifier = LogNotifier::new();
        let first = notifier.post_to_group("hello").await.unwrap();
        let second = notifier.send_direct(9, "hi").await.unwrap();
        assert_eq!(first.message_id, 1);
        assert_eq!(second.message_id, 2);
        assert_eq!(second.chat, Chat::Player(9));
        assert_eq!(notifier.mention(9), "player 9");
    }
}
