use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::models::RoundRecord;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to round source failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Round source returned non-success status: {0}")]
    Status(u16),
    #[error("Round source returned malformed data: {0}")]
    Decode(String),
}

/// Supplies the currently published rounds, already parsed into records.
#[async_trait]
pub trait RoundSource: Send + Sync {
    async fn fetch_latest_rounds(&self) -> Result<Vec<RoundRecord>, FetchError>;
}

/// Reads rounds from a JSON feed exposing an array of `RoundRecord`.
pub struct HttpRoundSource {
    client: Client,
    url: String,
}

impl HttpRoundSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RoundSource for HttpRoundSource {
    async fn fetch_latest_rounds(&self) -> Result<Vec<RoundRecord>, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let rounds: Vec<RoundRecord> =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        debug!(url = %self.url, count = rounds.len(), "Fetched rounds from source.");
        Ok(rounds)
    }
}

/// Official pages where OINP publishes invitation rounds.
#[derive(Debug, Clone, Serialize)]
pub struct OfficialSource {
    pub name: &'static str,
    pub url: &'static str,
    pub description: &'static str,
}

pub fn official_sources() -> Vec<OfficialSource> {
    vec![
        OfficialSource {
            name: "OINP Updates 2025",
            url: "https://www.ontario.ca/page/2025-ontario-immigrant-nominee-program-updates",
            description: "Official announcements and updates for the Ontario Immigrant Nominee Program",
        },
        OfficialSource {
            name: "OINP Invitations",
            url: "https://www.ontario.ca/page/ontario-immigrant-nominee-program-oinp-invitations-apply",
            description: "Historical data on invitations issued by OINP",
        },
    ]
}
