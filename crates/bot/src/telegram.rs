//! Telegram Bot API transport.
//!
//! Implements the core [`Transport`] capability trait over the Bot HTTP
//! API with bounded timeouts and a single retry on request-level
//! failures. API-level rejections (`ok: false`) are not retried.

use async_trait::async_trait;
use confide_common::{AppError, AppResult};
use confide_core::transport::{ButtonPress, InlineKeyboard, MessageRef, Transport};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Long-poll window for `getUpdates`.
pub const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Inbound chat, as far as this bot cares.
#[derive(Debug, Clone, Deserialize)]
pub struct WireChat {
    pub id: i64,
}

/// Inbound user.
#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: i64,
    pub first_name: String,
}

/// Inbound message.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub message_id: i64,
    pub chat: WireChat,
    pub from: Option<WireUser>,
    pub text: Option<String>,
}

/// Inbound button press.
#[derive(Debug, Clone, Deserialize)]
pub struct WireCallbackQuery {
    pub id: String,
    pub from: WireUser,
    pub message: Option<WireMessage>,
    pub data: Option<String>,
}

/// One long-poll update.
#[derive(Debug, Clone, Deserialize)]
pub struct WireUpdate {
    pub update_id: i64,
    pub message: Option<WireMessage>,
    pub callback_query: Option<WireCallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct WireMe {
    username: String,
}

#[derive(Debug, Deserialize)]
struct WireSent {
    message_id: i64,
    chat: WireChat,
}

/// Telegram Bot API client.
pub struct TelegramTransport {
    http: reqwest::Client,
    base: String,
    username: OnceCell<String>,
}

impl TelegramTransport {
    /// Create a transport against `api_url` with the given bot token.
    pub fn new(api_url: &str, token: &str) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            username: OnceCell::new(),
        })
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
        timeout: Option<Duration>,
    ) -> AppResult<T> {
        let url = format!("{}/{method}", self.base);

        let request = || {
            let mut builder = self.http.post(&url).json(payload);
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }
            builder.send()
        };

        // One retry on request-level failure, no backoff.
        let response = match request().await {
            Ok(response) => response,
            Err(first) => {
                warn!(method, error = %first, "Bot API request failed, retrying once");
                request()
                    .await
                    .map_err(|e| AppError::Transport(format!("{method}: {e}")))?
            }
        };

        let api: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("{method}: {e}")))?;

        if !api.ok {
            return Err(AppError::Transport(format!(
                "{method}: {}",
                api.description.unwrap_or_else(|| "unknown error".to_string())
            )));
        }
        api.result
            .ok_or_else(|| AppError::Transport(format!("{method}: missing result")))
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> AppResult<Vec<WireUpdate>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message", "callback_query"],
            }),
            Some(Duration::from_secs(POLL_TIMEOUT_SECS + 10)),
        )
        .await
    }
}

fn markup_to_json(markup: &InlineKeyboard) -> Value {
    let rows: Vec<Vec<Value>> = markup
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| match &button.press {
                    ButtonPress::Callback(data) => {
                        json!({ "text": button.text, "callback_data": data })
                    }
                    ButtonPress::Url(url) => json!({ "text": button.text, "url": url }),
                })
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<InlineKeyboard>,
    ) -> AppResult<MessageRef> {
        let mut payload = json!({ "chat_id": chat_id, "text": text });
        if let Some(markup) = markup {
            payload["reply_markup"] = markup_to_json(&markup);
        }

        let sent: WireSent = self.call("sendMessage", &payload, None).await?;
        Ok(MessageRef {
            chat_id: sent.chat.id,
            message_id: sent.message_id,
        })
    }

    async fn edit_message_text(
        &self,
        message: MessageRef,
        text: &str,
        markup: Option<InlineKeyboard>,
    ) -> AppResult<()> {
        let mut payload = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text,
        });
        if let Some(markup) = markup {
            payload["reply_markup"] = markup_to_json(&markup);
        }

        self.call::<Value>("editMessageText", &payload, None)
            .await
            .map(|_| ())
    }

    async fn edit_message_reply_markup(
        &self,
        message: MessageRef,
        markup: Option<InlineKeyboard>,
    ) -> AppResult<()> {
        let mut payload = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
        });
        if let Some(markup) = markup {
            payload["reply_markup"] = markup_to_json(&markup);
        }

        self.call::<Value>("editMessageReplyMarkup", &payload, None)
            .await
            .map(|_| ())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> AppResult<()> {
        let mut payload = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            payload["text"] = Value::String(text.to_string());
        }

        self.call::<bool>("answerCallbackQuery", &payload, None)
            .await
            .map(|_| ())
    }

    async fn delete_message(&self, message: MessageRef) -> AppResult<()> {
        self.call::<bool>(
            "deleteMessage",
            &json!({
                "chat_id": message.chat_id,
                "message_id": message.message_id,
            }),
            None,
        )
        .await
        .map(|_| ())
    }

    async fn bot_username(&self) -> AppResult<String> {
        let username = self
            .username
            .get_or_try_init(|| async {
                let me: WireMe = self.call("getMe", &json!({}), None).await?;
                Ok::<_, AppError>(me.username)
            })
            .await?;
        Ok(username.clone())
    }
}
