use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::senders::{
    Notifier, NotifyError, noop::NoopNotifier, telegram::ChatBotNotifier,
    webhook::WebhookNotifier,
};
use crate::monitor::models::{MonitorConfig, NotifierKind, credential_keys};

/// Produces the notifier selected by a config snapshot.
pub trait NotifierFactory: Send + Sync {
    fn notifier_for(&self, config: &MonitorConfig) -> Arc<dyn Notifier>;
}

/// Builds HTTP-backed notifiers sharing one connection pool.
#[derive(Clone)]
pub struct NotificationService {
    client: Client,
    telegram_api_base: String,
}

impl NotificationService {
    pub fn new(timeout: Duration, telegram_api_base: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, telegram_api_base))
    }

    pub fn with_client(client: Client, telegram_api_base: impl Into<String>) -> Self {
        Self {
            client,
            telegram_api_base: telegram_api_base.into(),
        }
    }
}

impl NotifierFactory for NotificationService {
    fn notifier_for(&self, config: &MonitorConfig) -> Arc<dyn Notifier> {
        let credential = |key: &str| config.credential(key).unwrap_or_default().to_string();
        match config.notifier_kind {
            NotifierKind::None => Arc::new(NoopNotifier),
            NotifierKind::Webhook => Arc::new(WebhookNotifier::new(
                self.client.clone(),
                credential(credential_keys::WEBHOOK_URL),
            )),
            NotifierKind::Chatbot => Arc::new(ChatBotNotifier::new(
                self.client.clone(),
                self.telegram_api_base.clone(),
                credential(credential_keys::BOT_TOKEN),
                credential(credential_keys::CHAT_ID),
            )),
        }
    }
}
