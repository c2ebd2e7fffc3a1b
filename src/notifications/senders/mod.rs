use async_trait::async_trait;
use thiserror::Error;

use crate::monitor::models::{NotifierKind, RoundRecord};

pub mod noop;
pub mod telegram;
pub mod webhook;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Invalid configuration for notifier: {0}")]
    Config(String),
    #[error("Notification endpoint returned non-success status: {status}. Body: {body}")]
    Delivery { status: u16, body: String },
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl NotifyError {
    pub fn is_config(&self) -> bool {
        matches!(self, NotifyError::Config(_))
    }
}

/// A delivery channel for round alerts.
///
/// Each call performs at most one outbound request and never retries;
/// credentials are validated before any network activity.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn kind(&self) -> NotifierKind;

    /// Sends an alert describing `rounds`.
    async fn send(&self, rounds: &[RoundRecord]) -> Result<(), NotifyError>;

    /// Sends a connectivity check message.
    async fn send_test(&self) -> Result<(), NotifyError>;
}

/// Reads the response status and turns anything but 2xx into `Delivery`.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(NotifyError::Delivery {
        status: status.as_u16(),
        body,
    })
}
