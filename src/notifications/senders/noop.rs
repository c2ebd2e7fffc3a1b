use async_trait::async_trait;
use tracing::debug;

use super::{Notifier, NotifyError};
use crate::monitor::models::{NotifierKind, RoundRecord};

/// Used when no notification channel is configured. Alerts are dropped;
/// a test send reports the missing configuration.
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    fn kind(&self) -> NotifierKind {
        NotifierKind::None
    }

    async fn send(&self, rounds: &[RoundRecord]) -> Result<(), NotifyError> {
        debug!(count = rounds.len(), "No notifier configured, dropping alert.");
        Ok(())
    }

    async fn send_test(&self) -> Result<(), NotifyError> {
        Err(NotifyError::Config(
            "No notification channel is configured.".to_string(),
        ))
    }
}
