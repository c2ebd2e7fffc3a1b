//! Owns the monitoring lifecycle: the periodic timer, the check cycle
//! (fetch, diff, notify, record) and the user-facing operations.
//!
//! A check cycle never overlaps another one on the same scheduler. Timer
//! ticks are spaced from the start of the previous tick, so a slow check does
//! not push later checks back. `stop()` only cancels the timer; a check that
//! is already running completes and its effects are kept.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

use super::change_detector;
use super::history::HistoryLog;
use super::models::{
    CheckOutcome, CheckReport, CheckTrigger, ConfigPatch, DeliveryStatus, MonitorConfig,
    MonitorStatus, NotifierKind, RoundRecord, SchedulerState,
};
use super::source::{FetchError, RoundSource};
use super::store::{ConfigStore, SeenState, SeenStateStore, StoreError};
use crate::notifications::{NotifierFactory, NotifyError};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Failed to check for new rounds: {0}")]
    Fetch(#[from] FetchError),
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Monitoring is not active")]
    Inactive,
    #[error("Failed to persist monitor data: {0}")]
    Store(#[from] StoreError),
}

struct RunState {
    last_check: Option<DateTime<Utc>>,
    last_error: Option<String>,
    seen: SeenState,
    history: HistoryLog,
}

struct Timer {
    handle: JoinHandle<()>,
    shutdown_tx: oneshot::Sender<()>,
    period: Duration,
}

struct Inner {
    source: Arc<dyn RoundSource>,
    notifiers: Arc<dyn NotifierFactory>,
    config_store: ConfigStore,
    state_store: SeenStateStore,
    // Held only briefly; a check cycle works on a cloned snapshot.
    config: AsyncMutex<MonitorConfig>,
    run: Mutex<RunState>,
    in_flight: AtomicBool,
    timer: Mutex<Option<Timer>>,
}

/// Marks a check cycle as in flight for as long as it is alive.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn period_of(config: &MonitorConfig) -> Duration {
    Duration::from_secs(u64::from(config.check_interval_minutes) * 60)
}

#[derive(Clone)]
pub struct MonitorScheduler {
    inner: Arc<Inner>,
}

impl MonitorScheduler {
    /// Restores settings and dedup state from the stores. The timer is not
    /// armed until `start()` is called.
    pub fn new(
        source: Arc<dyn RoundSource>,
        notifiers: Arc<dyn NotifierFactory>,
        config_store: ConfigStore,
        state_store: SeenStateStore,
    ) -> Self {
        let config = config_store.load();
        let seen = state_store.load();
        info!(
            active = config.is_active,
            interval_minutes = config.check_interval_minutes,
            notifier = ?config.notifier_kind,
            seen_rounds = seen.seen_keys.len(),
            "Loaded monitor configuration."
        );

        Self {
            inner: Arc::new(Inner {
                source,
                notifiers,
                config_store,
                state_store,
                config: AsyncMutex::new(config),
                run: Mutex::new(RunState {
                    last_check: seen.last_check,
                    last_error: None,
                    seen,
                    history: HistoryLog::new(),
                }),
                in_flight: AtomicBool::new(false),
                timer: Mutex::new(None),
            }),
        }
    }

    fn run_state(&self) -> MutexGuard<'_, RunState> {
        self.inner.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<Timer>> {
        self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arms the periodic timer. Fails with `Inactive` unless the config says
    /// monitoring is on. Calling it again while armed changes nothing.
    pub async fn start(&self) -> Result<SchedulerState, MonitorError> {
        let config = self.inner.config.lock().await;
        if !config.is_active {
            return Err(MonitorError::Inactive);
        }
        self.arm(period_of(&config));
        Ok(self.state())
    }

    /// Cancels the pending timer. Returns whether a timer was armed.
    pub fn stop(&self) -> bool {
        self.disarm()
    }

    fn arm(&self, period: Duration) {
        let mut slot = self.timer_slot();
        if let Some(timer) = slot.as_ref() {
            if timer.period == period && !timer.handle.is_finished() {
                return;
            }
        }
        if let Some(old) = slot.take() {
            let _ = old.shutdown_tx.send(());
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let inner = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(timer_loop(inner, period, shutdown_rx));
        info!(period_secs = period.as_secs(), "Monitor timer armed.");
        *slot = Some(Timer {
            handle,
            shutdown_tx,
            period,
        });
    }

    fn disarm(&self) -> bool {
        match self.timer_slot().take() {
            Some(timer) => {
                if timer.shutdown_tx.send(()).is_err() {
                    debug!("Monitor timer had already exited.");
                }
                info!("Monitor timer cancelled.");
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.inner.in_flight.load(Ordering::Acquire) {
            return SchedulerState::Checking;
        }
        match self.timer_slot().as_ref() {
            Some(timer) if !timer.handle.is_finished() => SchedulerState::Idle,
            _ => SchedulerState::Stopped,
        }
    }

    /// Runs one check cycle immediately, whether or not the timer is armed.
    /// Returns `AlreadyRunning` without touching the source when another
    /// cycle is in flight.
    pub async fn check_now(&self) -> Result<CheckOutcome, MonitorError> {
        self.run_check(CheckTrigger::Manual).await
    }

    async fn run_check(&self, trigger: CheckTrigger) -> Result<CheckOutcome, MonitorError> {
        let Some(_in_flight) = InFlight::acquire(&self.inner.in_flight) else {
            debug!(?trigger, "A check is already in flight, skipping.");
            return Ok(CheckOutcome::AlreadyRunning);
        };

        let config = self.inner.config.lock().await.clone();
        debug!(?trigger, "Checking for new rounds.");

        let fetched = match self.inner.source.fetch_latest_rounds().await {
            Ok(rounds) => rounds,
            Err(e) => {
                warn!(?trigger, error = %e, "Failed to fetch rounds.");
                self.finish_failed_attempt(e.to_string()).await;
                return Err(e.into());
            }
        };

        let (new_rounds, checked_at) = self.mark_seen(&fetched).await;

        let delivery = if new_rounds.is_empty() {
            DeliveryStatus::NothingToSend
        } else {
            let notifier = self.inner.notifiers.notifier_for(&config);
            if notifier.kind() == NotifierKind::None {
                info!(count = new_rounds.len(), "New rounds found, but no notification channel configured.");
                DeliveryStatus::NoChannel
            } else {
                match notifier.send(&new_rounds).await {
                    Ok(()) => {
                        info!(count = new_rounds.len(), notifier = ?notifier.kind(), "Sent new round notification.");
                        DeliveryStatus::Delivered
                    }
                    Err(e) => {
                        warn!(count = new_rounds.len(), notifier = ?notifier.kind(), error = %e, "Failed to send new round notification.");
                        DeliveryStatus::Failed(e.to_string())
                    }
                }
            }
        };

        {
            let mut run = self.run_state();
            run.last_error = match &delivery {
                DeliveryStatus::Failed(e) => Some(e.clone()),
                _ => None,
            };
            run.history.append(&new_rounds);
        }

        info!(
            ?trigger,
            fetched = fetched.len(),
            new = new_rounds.len(),
            ?delivery,
            "Check cycle completed."
        );

        Ok(CheckOutcome::Completed(CheckReport {
            trigger,
            checked_at,
            fetched: fetched.len(),
            new_rounds,
            delivery,
        }))
    }

    /// Diffs against the seen set, stamps the check time and persists both
    /// before any delivery is attempted.
    async fn mark_seen(&self, fetched: &[RoundRecord]) -> (Vec<RoundRecord>, DateTime<Utc>) {
        let now = Utc::now();
        let (new_records, snapshot) = {
            let mut run = self.run_state();
            let changes = change_detector::diff(fetched, &run.seen.seen_keys);
            if !changes.new_records.is_empty() {
                run.seen.seen_keys = changes.seen_keys;
            }
            run.last_check = Some(now);
            run.seen.last_check = Some(now);
            (changes.new_records, run.seen.clone())
        };
        self.persist_seen(snapshot).await;
        (new_records, now)
    }

    /// Stamps a failed attempt.
    async fn finish_failed_attempt(&self, error: String) {
        let now = Utc::now();
        let snapshot = {
            let mut run = self.run_state();
            run.last_check = Some(now);
            run.last_error = Some(error);
            run.seen.last_check = Some(now);
            run.seen.clone()
        };
        self.persist_seen(snapshot).await;
    }

    /// Writes the seen state off the async workers. Checks never overlap, so
    /// writes land in order.
    async fn persist_seen(&self, snapshot: SeenState) {
        let store = self.inner.state_store.clone();
        let result = tokio::task::spawn_blocking(move || store.save(&snapshot)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Failed to persist seen rounds."),
            Err(e) => error!(error = %e, "Seen state writer panicked."),
        }
    }

    /// Sends a connectivity test through the configured notifier.
    pub async fn send_test_notification(&self) -> Result<(), MonitorError> {
        let config = self.config().await;
        let notifier = self.inner.notifiers.notifier_for(&config);
        notifier.send_test().await?;
        info!(notifier = ?notifier.kind(), "Test notification sent.");
        Ok(())
    }

    pub async fn config(&self) -> MonitorConfig {
        self.inner.config.lock().await.clone()
    }

    /// Validates and persists a partial settings change. The new settings
    /// apply from the next check cycle; toggling `isActive` or changing the
    /// interval re-arms or cancels the timer.
    pub async fn update_config(&self, patch: ConfigPatch) -> Result<MonitorConfig, MonitorError> {
        let mut config = self.inner.config.lock().await;
        let next = config
            .with_patch(&patch)
            .map_err(MonitorError::InvalidConfig)?;
        self.inner.config_store.save(&next)?;

        let reschedule = next.is_active != config.is_active
            || next.check_interval_minutes != config.check_interval_minutes;
        *config = next.clone();

        if next.email_notifications_enabled && patch.email_notifications_enabled == Some(true) {
            warn!("Email notifications were enabled, but no email transport is available.");
        }
        if reschedule {
            if next.is_active {
                self.arm(period_of(&next));
            } else {
                self.disarm();
            }
        }

        info!(
            active = next.is_active,
            interval_minutes = next.check_interval_minutes,
            notifier = ?next.notifier_kind,
            "Monitor configuration updated."
        );
        Ok(next)
    }

    pub fn history(&self) -> Vec<RoundRecord> {
        self.run_state().history.list()
    }

    pub fn clear_history(&self) {
        self.run_state().history.clear();
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.run_state().last_check
    }

    pub async fn status(&self) -> MonitorStatus {
        let config = self.config().await;
        let state = self.state();
        let run = self.run_state();
        MonitorStatus {
            state,
            is_active: config.is_active,
            is_check_in_flight: self.inner.in_flight.load(Ordering::Acquire),
            check_interval_minutes: config.check_interval_minutes,
            last_check: run.last_check,
            last_error: run.last_error.clone(),
            history_len: run.history.len(),
            seen_rounds: run.seen.seen_keys.len(),
        }
    }
}

async fn timer_loop(inner: Weak<Inner>, period: Duration, mut shutdown_rx: oneshot::Receiver<()>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                debug!("Monitor timer received shutdown signal.");
                break;
            }

            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    debug!("Scheduler dropped, monitor timer exiting.");
                    break;
                };
                let scheduler = MonitorScheduler { inner };
                match scheduler.run_check(CheckTrigger::Timer).await {
                    Ok(CheckOutcome::AlreadyRunning) => {
                        debug!("Scheduled tick skipped, a manual check is running.");
                    }
                    Ok(CheckOutcome::Completed(_)) => {}
                    Err(e) => {
                        warn!(error = %e, "Scheduled check failed, will retry on the next tick.");
                    }
                }
            }
        }
    }
}
