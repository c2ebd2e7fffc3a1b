use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{Notifier, NotifyError, check_response};
use crate::monitor::models::{NotifierKind, RoundRecord};
use crate::notifications::format;
use crate::notifications::models::TelegramMessage;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Escapes text for Telegram MarkdownV2.
/// Characters to escape: _ * [ ] ( ) ~ ` > # + - = | { } . ! \
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped_text = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|'
            | '{' | '}' | '.' | '!' | '\\' => {
                escaped_text.push('\\');
                escaped_text.push(c);
            }
            _ => escaped_text.push(c),
        }
    }
    escaped_text
}

/// A notifier for pushing alerts through the Telegram Bot API.
pub struct ChatBotNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl ChatBotNotifier {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    fn endpoint(&self) -> Result<String, NotifyError> {
        let bot_token = self.bot_token.trim();
        if bot_token.is_empty() {
            return Err(NotifyError::Config("Bot token is not configured.".to_string()));
        }
        if self.chat_id.trim().is_empty() {
            return Err(NotifyError::Config("Chat ID is not configured.".to_string()));
        }
        Ok(format!(
            "{}/bot{bot_token}/sendMessage",
            self.api_base.trim_end_matches('/')
        ))
    }

    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        let api_url = self.endpoint()?;
        let escaped = escape_markdown_v2(text);
        let payload = TelegramMessage {
            chat_id: self.chat_id.trim(),
            text: &escaped,
            parse_mode: "MarkdownV2",
        };

        debug!(chat_id = payload.chat_id, "Sending Telegram message.");
        let response = self.client.post(&api_url).json(&payload).send().await?;
        check_response(response).await
    }
}

#[async_trait]
impl Notifier for ChatBotNotifier {
    fn kind(&self) -> NotifierKind {
        NotifierKind::Chatbot
    }

    async fn send(&self, rounds: &[RoundRecord]) -> Result<(), NotifyError> {
        self.send_text(&format::round_summary(rounds)).await
    }

    async fn send_test(&self) -> Result<(), NotifyError> {
        self.send_text(format::TEST_MESSAGE).await
    }
}
