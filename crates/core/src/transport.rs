//! Message-transport capability surface.
//!
//! Core services talk to the chat platform through this trait only; the
//! bot crate provides the HTTP implementation. Every call is
//! fire-and-report: failures come back as `AppError::Transport` and never
//! panic the dispatch loop.

use async_trait::async_trait;
use confide_common::AppResult;
use std::sync::Arc;

use crate::codec;

/// A button press target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonPress {
    /// Callback data delivered back to the bot.
    Callback(String),
    /// External URL (deep links into the bot).
    Url(String),
}

/// One inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub press: ButtonPress,
}

impl InlineButton {
    /// A button that sends callback data.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            press: ButtonPress::Callback(data.into()),
        }
    }

    /// A button that opens a URL.
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            press: ButtonPress::Url(url.into()),
        }
    }
}

/// An inline keyboard: rows of buttons.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// Append a row of buttons.
    #[must_use]
    pub fn row(mut self, row: Vec<InlineButton>) -> Self {
        self.rows.push(row);
        self
    }
}

/// Reference to a sent message, used for later edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// The transport capability surface consumed by core services.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a message, optionally with an inline keyboard.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<InlineKeyboard>,
    ) -> AppResult<MessageRef>;

    /// Replace a message's text (and keyboard).
    async fn edit_message_text(
        &self,
        message: MessageRef,
        text: &str,
        markup: Option<InlineKeyboard>,
    ) -> AppResult<()>;

    /// Replace only a message's inline keyboard.
    async fn edit_message_reply_markup(
        &self,
        message: MessageRef,
        markup: Option<InlineKeyboard>,
    ) -> AppResult<()>;

    /// Acknowledge a button press, optionally with a toast.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> AppResult<()>;

    /// Delete a message.
    async fn delete_message(&self, message: MessageRef) -> AppResult<()>;

    /// The bot's public username, for deep-link URLs.
    async fn bot_username(&self) -> AppResult<String>;
}

/// Shared handle to the transport.
pub type TransportHandle = Arc<dyn Transport>;

/// Build the public post's keyboard: one deep-link button showing the live
/// comment count.
#[must_use]
pub fn channel_markup(bot_username: &str, submission_id: i64, count: u64) -> InlineKeyboard {
    let url = format!(
        "https://t.me/{bot_username}?start={}",
        codec::encode_deep_link(submission_id)
    );
    InlineKeyboard::default().row(vec![InlineButton::url(
        format!("💬 View/Add Comments ({count})"),
        url,
    )])
}

// ===== Test double =====

/// A recorded outbound transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Sent {
        chat_id: i64,
        text: String,
        markup: Option<InlineKeyboard>,
    },
    EditedText {
        message: MessageRef,
        text: String,
    },
    EditedMarkup {
        message: MessageRef,
        markup: Option<InlineKeyboard>,
    },
    Answered {
        callback_id: String,
        text: Option<String>,
    },
    Deleted(MessageRef),
}

/// In-memory transport that records every call, for tests.
///
/// `fail_sends` makes `send_message` fail, which is how the two-phase
/// publish discipline is exercised.
#[derive(Default)]
pub struct RecordingTransport {
    calls: std::sync::Mutex<Vec<Outbound>>,
    next_message_id: std::sync::atomic::AtomicI64,
    fail_sends: std::sync::atomic::AtomicBool,
}

impl RecordingTransport {
    /// Create a recording transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `send_message` calls fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Everything sent so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Outbound> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: Outbound) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<InlineKeyboard>,
    ) -> AppResult<MessageRef> {
        if self.fail_sends.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(confide_common::AppError::Transport(
                "send failed (test)".to_string(),
            ));
        }
        self.record(Outbound::Sent {
            chat_id,
            text: text.to_string(),
            markup,
        });
        let message_id = 1 + self
            .next_message_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(MessageRef {
            chat_id,
            message_id,
        })
    }

    async fn edit_message_text(
        &self,
        message: MessageRef,
        text: &str,
        _markup: Option<InlineKeyboard>,
    ) -> AppResult<()> {
        self.record(Outbound::EditedText {
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn edit_message_reply_markup(
        &self,
        message: MessageRef,
        markup: Option<InlineKeyboard>,
    ) -> AppResult<()> {
        self.record(Outbound::EditedMarkup { message, markup });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> AppResult<()> {
        self.record(Outbound::Answered {
            callback_id: callback_id.to_string(),
            text: text.map(ToString::to_string),
        });
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> AppResult<()> {
        self.record(Outbound::Deleted(message));
        Ok(())
    }

    async fn bot_username(&self) -> AppResult<String> {
        Ok("confide_bot".to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_markup_embeds_deep_link_and_count() {
        let markup = channel_markup("confide_bot", 55, 3);

        assert_eq!(markup.rows.len(), 1);
        let button = &markup.rows[0][0];
        assert_eq!(button.text, "💬 View/Add Comments (3)");
        assert_eq!(
            button.press,
            ButtonPress::Url("https://t.me/confide_bot?start=conf_55".to_string())
        );
    }

    #[tokio::test]
    async fn test_recording_transport_assigns_ascending_ids() {
        let transport = RecordingTransport::new();

        let first = transport.send_message(1, "a", None).await.unwrap();
        let second = transport.send_message(1, "b", None).await.unwrap();

        assert!(second.message_id > first.message_id);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_recording_transport_send_failure() {
        let transport = RecordingTransport::new();
        transport.fail_sends(true);

        let result = transport.send_message(1, "a", None).await;

        assert!(result.is_err());
        assert!(transport.calls().is_empty());
    }
}
