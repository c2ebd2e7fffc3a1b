use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::debug;

use super::{Notifier, NotifyError, check_response};
use crate::monitor::models::{NotifierKind, RoundRecord};
use crate::notifications::format;
use crate::notifications::models::WebhookPayload;

/// A notifier that POSTs a JSON document to a user-supplied URL
/// (e.g. a Zapier catch hook).
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    fn url(&self) -> Result<&str, NotifyError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(NotifyError::Config(
                "Webhook URL is not configured.".to_string(),
            ));
        }
        Ok(url)
    }

    async fn post(&self, url: &str, payload: &WebhookPayload<'_>) -> Result<(), NotifyError> {
        debug!(url, event = payload.event_type, "Posting webhook notification.");
        let response = self.client.post(url).json(payload).send().await?;
        check_response(response).await
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn kind(&self) -> NotifierKind {
        NotifierKind::Webhook
    }

    async fn send(&self, rounds: &[RoundRecord]) -> Result<(), NotifyError> {
        let url = self.url()?;
        let payload = WebhookPayload::rounds(rounds, format::round_summary(rounds), Utc::now());
        self.post(url, &payload).await
    }

    async fn send_test(&self) -> Result<(), NotifyError> {
        let url = self.url()?;
        let payload = WebhookPayload::test(format::TEST_MESSAGE.to_string(), Utc::now());
        self.post(url, &payload).await
    }
}
