use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIN_CHECK_INTERVAL_MINUTES: u32 = 5;
pub const MAX_CHECK_INTERVAL_MINUTES: u32 = 1440;
pub const DEFAULT_CHECK_INTERVAL_MINUTES: u32 = 30;

/// One published invitation round as reported by the upstream source.
///
/// The upstream feed historically names the category `type` and the count
/// `invitations`; both spellings are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    pub date: String,
    #[serde(alias = "type")]
    pub category: String,
    #[serde(alias = "invitations")]
    pub invitation_count: u32,
    #[serde(default)]
    pub streams: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<u32>,
    #[serde(default)]
    pub description: String,
}

impl RoundRecord {
    pub fn key(&self) -> RoundKey {
        RoundKey {
            date: self.date.clone(),
            category: self.category.clone(),
        }
    }
}

/// Dedup identity of a round: the source carries no stable id, so
/// (date, category) is the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoundKey {
    pub date: String,
    pub category: String,
}

impl RoundKey {
    pub fn new(date: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            category: category.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    None,
    Webhook,
    Chatbot,
}

/// Credential keys understood by the notifiers.
pub mod credential_keys {
    pub const WEBHOOK_URL: &str = "url";
    pub const BOT_TOKEN: &str = "botToken";
    pub const CHAT_ID: &str = "chatId";
}

/// Persisted monitor settings. Serialized with camelCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfig {
    pub notifier_kind: NotifierKind,
    pub notifier_credentials: BTreeMap<String, String>,
    pub check_interval_minutes: u32,
    pub is_active: bool,
    pub email_notifications_enabled: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            notifier_kind: NotifierKind::None,
            notifier_credentials: BTreeMap::new(),
            check_interval_minutes: DEFAULT_CHECK_INTERVAL_MINUTES,
            is_active: false,
            email_notifications_enabled: false,
        }
    }
}

impl MonitorConfig {
    pub fn credential(&self, key: &str) -> Option<&str> {
        self.notifier_credentials
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Applies a partial update, returning the new config without touching `self`.
    pub fn with_patch(&self, patch: &ConfigPatch) -> Result<Self, String> {
        let mut next = self.clone();
        if let Some(kind) = patch.notifier_kind {
            next.notifier_kind = kind;
        }
        if let Some(credentials) = &patch.notifier_credentials {
            next.notifier_credentials = credentials.clone();
        }
        if let Some(minutes) = patch.check_interval_minutes {
            if !(MIN_CHECK_INTERVAL_MINUTES..=MAX_CHECK_INTERVAL_MINUTES).contains(&minutes) {
                return Err(format!(
                    "checkIntervalMinutes must be between {MIN_CHECK_INTERVAL_MINUTES} and {MAX_CHECK_INTERVAL_MINUTES}, got {minutes}"
                ));
            }
            next.check_interval_minutes = minutes;
        }
        if let Some(active) = patch.is_active {
            next.is_active = active;
        }
        if let Some(email) = patch.email_notifications_enabled {
            next.email_notifications_enabled = email;
        }
        Ok(next)
    }

    /// Brings values read from storage back into their valid ranges.
    pub fn sanitized(mut self) -> Self {
        self.check_interval_minutes = self
            .check_interval_minutes
            .clamp(MIN_CHECK_INTERVAL_MINUTES, MAX_CHECK_INTERVAL_MINUTES);
        self
    }
}

/// API request body for `update_config`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    pub notifier_kind: Option<NotifierKind>,
    pub notifier_credentials: Option<BTreeMap<String, String>>,
    pub check_interval_minutes: Option<u32>,
    pub is_active: Option<bool>,
    pub email_notifications_enabled: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Stopped,
    Idle,
    Checking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckTrigger {
    Timer,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "camelCase")]
pub enum DeliveryStatus {
    NothingToSend,
    /// New rounds were found but no notification channel is configured.
    NoChannel,
    Delivered,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub trigger: CheckTrigger,
    pub checked_at: DateTime<Utc>,
    pub fetched: usize,
    pub new_rounds: Vec<RoundRecord>,
    pub delivery: DeliveryStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum CheckOutcome {
    /// Another check cycle was in flight; nothing was done.
    AlreadyRunning,
    Completed(CheckReport),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    pub state: SchedulerState,
    pub is_active: bool,
    pub is_check_in_flight: bool,
    pub check_interval_minutes: u32,
    pub last_check: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub history_len: usize,
    pub seen_rounds: usize,
}
