use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{Router, body::Bytes, extract::State, http::StatusCode, http::Uri};
use tokio::sync::Notify;
use tokio::time::Instant;

use oinp_monitor::monitor::models::{MonitorConfig, NotifierKind, RoundRecord, credential_keys};
use oinp_monitor::monitor::{ConfigStore, FetchError, MonitorScheduler, RoundSource, SeenStateStore};
use oinp_monitor::notifications::{Notifier, NotifierFactory, NotifyError};

pub fn employer_job_offer() -> RoundRecord {
    RoundRecord {
        date: "2025-08-28".to_string(),
        category: "Employer Job Offer".to_string(),
        invitation_count: 348,
        streams: vec!["Foreign Worker".to_string()],
        min_score: Some(53),
        description: "Invitations issued to candidates with job offers in Northern Ontario"
            .to_string(),
    }
}

pub fn human_capital_priorities() -> RoundRecord {
    RoundRecord {
        date: "2025-08-20".to_string(),
        category: "Express Entry: Human Capital Priorities stream".to_string(),
        invitation_count: 1235,
        streams: vec!["Express Entry".to_string()],
        min_score: Some(485),
        description: "Invitations issued under the Human Capital Priorities stream".to_string(),
    }
}

/// A round source returning a fixed batch, with optional scripted failures,
/// latency, and a gate that holds the fetch open until released.
pub struct ScriptedSource {
    rounds: Mutex<Vec<RoundRecord>>,
    failures: Mutex<VecDeque<u16>>,
    calls: Mutex<Vec<Instant>>,
    delay: Option<Duration>,
    gated: bool,
    pub entered: Notify,
    pub release: Notify,
}

impl ScriptedSource {
    pub fn new(rounds: Vec<RoundRecord>) -> Self {
        Self {
            rounds: Mutex::new(rounds),
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
            gated: false,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub fn set_rounds(&self, rounds: Vec<RoundRecord>) {
        *self.rounds.lock().unwrap() = rounds;
    }

    /// The next fetch fails with the given upstream status.
    pub fn fail_next(&self, status: u16) {
        self.failures.lock().unwrap().push_back(status);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoundSource for ScriptedSource {
    async fn fetch_latest_rounds(&self) -> Result<Vec<RoundRecord>, FetchError> {
        self.calls.lock().unwrap().push(Instant::now());
        if self.gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = self.failures.lock().unwrap().pop_front() {
            return Err(FetchError::Status(status));
        }
        Ok(self.rounds.lock().unwrap().clone())
    }
}

#[derive(Debug, Clone)]
pub struct SentAlert {
    pub kind: NotifierKind,
    pub rounds: Vec<RoundRecord>,
}

#[derive(Default)]
struct RecorderState {
    sent: Mutex<Vec<SentAlert>>,
    tests: Mutex<Vec<NotifierKind>>,
    fail_with: Mutex<Option<u16>>,
}

/// Builds notifiers that record what they were asked to deliver.
#[derive(Clone, Default)]
pub struct RecordingNotifiers {
    state: Arc<RecorderState>,
}

impl RecordingNotifiers {
    pub fn sent(&self) -> Vec<SentAlert> {
        self.state.sent.lock().unwrap().clone()
    }

    pub fn test_sends(&self) -> Vec<NotifierKind> {
        self.state.tests.lock().unwrap().clone()
    }

    pub fn fail_with(&self, status: Option<u16>) {
        *self.state.fail_with.lock().unwrap() = status;
    }
}

struct RecordingNotifier {
    kind: NotifierKind,
    state: Arc<RecorderState>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn kind(&self) -> NotifierKind {
        self.kind
    }

    async fn send(&self, rounds: &[RoundRecord]) -> Result<(), NotifyError> {
        self.state.sent.lock().unwrap().push(SentAlert {
            kind: self.kind,
            rounds: rounds.to_vec(),
        });
        match *self.state.fail_with.lock().unwrap() {
            Some(status) => Err(NotifyError::Delivery {
                status,
                body: "scripted failure".to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn send_test(&self) -> Result<(), NotifyError> {
        self.state.tests.lock().unwrap().push(self.kind);
        Ok(())
    }
}

impl NotifierFactory for RecordingNotifiers {
    fn notifier_for(&self, config: &MonitorConfig) -> Arc<dyn Notifier> {
        Arc::new(RecordingNotifier {
            kind: config.notifier_kind,
            state: self.state.clone(),
        })
    }
}

/// Settings with a webhook channel, so recorded sends reach the notifier.
pub fn webhook_config() -> MonitorConfig {
    let mut config = MonitorConfig {
        notifier_kind: NotifierKind::Webhook,
        ..Default::default()
    };
    config.notifier_credentials.insert(
        credential_keys::WEBHOOK_URL.to_string(),
        "https://hooks.example.test/catch".to_string(),
    );
    config
}

/// A scheduler over `dir` whose stored settings select the webhook channel.
pub fn scheduler_in(
    dir: &Path,
    source: Arc<ScriptedSource>,
    notifiers: RecordingNotifiers,
) -> MonitorScheduler {
    ConfigStore::in_dir(dir).save(&webhook_config()).unwrap();
    MonitorScheduler::new(
        source,
        Arc::new(notifiers),
        ConfigStore::in_dir(dir),
        SeenStateStore::in_dir(dir),
    )
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub body: serde_json::Value,
}

struct MockState {
    status: StatusCode,
    response_body: String,
    requests: Mutex<Vec<CapturedRequest>>,
}

/// A local HTTP endpoint that records every request and answers with a
/// fixed status and body.
pub struct MockEndpoint {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    _server: tokio::task::JoinHandle<()>,
}

async fn capture(State(state): State<Arc<MockState>>, uri: Uri, body: Bytes) -> (StatusCode, String) {
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.requests.lock().unwrap().push(CapturedRequest {
        path: uri.path().to_string(),
        body,
    });
    (state.status, state.response_body.clone())
}

impl MockEndpoint {
    pub async fn start(status: StatusCode, response_body: impl Into<String>) -> Self {
        let state = Arc::new(MockState {
            status,
            response_body: response_body.into(),
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(capture).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            _server: server,
        }
    }

    pub async fn ok() -> Self {
        Self::start(StatusCode::OK, "{\"ok\":true}").await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}
