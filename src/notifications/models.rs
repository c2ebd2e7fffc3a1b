use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::monitor::models::RoundRecord;

pub const ROUND_OPEN_EVENT: &str = "oinp_round_open";
pub const TEST_EVENT: &str = "test_notification";

/// JSON body POSTed to a webhook.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    /// ISO-8601 with millisecond precision.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<&'a [RoundRecord]>,
    pub message: String,
}

impl<'a> WebhookPayload<'a> {
    pub fn rounds(rounds: &'a [RoundRecord], message: String, now: DateTime<Utc>) -> Self {
        Self {
            event_type: ROUND_OPEN_EVENT,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            rounds: Some(rounds),
            message,
        }
    }

    pub fn test(message: String, now: DateTime<Utc>) -> Self {
        Self {
            event_type: TEST_EVENT,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            rounds: None,
            message,
        }
    }
}

/// Body of a Telegram `sendMessage` call.
#[derive(Debug, Serialize)]
pub struct TelegramMessage<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'a str,
}
