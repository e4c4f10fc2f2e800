//! Telegram Bot API delivery channel.
//!
//! Sends the long alert message to a chat via `sendMessage`, prefixed with
//! severity and the short message. With `MarkdownV2` parse mode the text is
//! escaped before sending.

use crate::payload::OutboundAlertPayload;
use crate::traits::{Notifier, NotifyError};

/// Escapes special characters for Telegram MarkdownV2 parse mode.
pub fn escape_markdown_v2(text: &str) -> String {
    const SPECIAL: [char; 18] = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut out = String::with_capacity(text.len() * 2);
    for ch in text.chars() {
        if SPECIAL.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Sends alert payloads through a Telegram bot.
#[derive(Debug)]
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    parse_mode: Option<String>,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// `bot_token` may be a literal token or a `${ENV_VAR}` reference.
    pub fn from_config(
        bot_token: String,
        chat_id: String,
        parse_mode: Option<String>,
    ) -> Result<Self, NotifyError> {
        let token = match bot_token.strip_prefix("${") {
            Some(reference) => {
                let var = reference.strip_suffix('}').ok_or_else(|| {
                    NotifyError::Config(format!("Malformed env var reference: {bot_token}"))
                })?;
                std::env::var(var).map_err(|_| {
                    NotifyError::Config(format!("Environment variable '{var}' is not set"))
                })?
            }
            None => bot_token,
        };

        if token.is_empty() {
            return Err(NotifyError::Config(
                "Telegram bot token must not be empty".to_string(),
            ));
        }
        if chat_id.trim().is_empty() {
            return Err(NotifyError::Config(
                "Telegram chat id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            bot_token: token,
            chat_id,
            parse_mode,
            client: reqwest::Client::new(),
        })
    }

    /// Message text for a payload.
    fn text_for(&self, payload: &OutboundAlertPayload) -> String {
        let raw = format!(
            "[{}] {}\n{}",
            payload.severity, payload.message.short, payload.message.long
        );
        match self.parse_mode.as_deref() {
            Some("MarkdownV2") => escape_markdown_v2(&raw),
            _ => raw,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, payload: &OutboundAlertPayload) -> Result<(), NotifyError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);

        let mut body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": self.text_for(payload),
        });
        if let Some(ref mode) = self.parse_mode {
            body["parse_mode"] = serde_json::Value::String(mode.clone());
        }

        tracing::debug!(
            chat_id = %self.chat_id,
            event_id = %payload.event_id,
            "Sending Telegram alert"
        );

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let resp_body: serde_json::Value = response.json().await?;

        if resp_body.get("ok") == Some(&serde_json::Value::Bool(true)) {
            return Ok(());
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp_body
                .get("parameters")
                .and_then(|p| p.get("retry_after"))
                .and_then(|v| v.as_u64())
                .unwrap_or(30);
            return Err(NotifyError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let description = resp_body
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Telegram API error");
        Err(NotifyError::Transport(format!("Telegram API error: {description}")))
    }

    fn channel_name(&self) -> &str {
        "telegram"
    }
}
