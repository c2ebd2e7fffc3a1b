use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

use crate::monitor::source::{OfficialSource, official_sources};
use crate::monitor::{CheckOutcome, ConfigPatch, MonitorConfig, MonitorStatus, RoundRecord};
use crate::web::{AppError, AppState};

// Mounted under /api/monitor
pub fn create_monitor_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(get_status))
        .route("/start", post(start_monitoring))
        .route("/stop", post(stop_monitoring))
        .route("/check", post(check_now))
        .route("/test-notification", post(send_test_notification))
        .route("/config", get(get_config).patch(update_config))
        .route("/history", get(get_history).delete(clear_history))
}

async fn get_status(State(app_state): State<Arc<AppState>>) -> Json<MonitorStatus> {
    Json(app_state.scheduler.status().await)
}

/// Turns monitoring on; the setting is persisted and the timer armed.
async fn start_monitoring(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<MonitorStatus>, AppError> {
    let patch = ConfigPatch {
        is_active: Some(true),
        ..Default::default()
    };
    app_state.scheduler.update_config(patch).await?;
    app_state.scheduler.start().await?;
    Ok(Json(app_state.scheduler.status().await))
}

async fn stop_monitoring(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<MonitorStatus>, AppError> {
    let patch = ConfigPatch {
        is_active: Some(false),
        ..Default::default()
    };
    app_state.scheduler.update_config(patch).await?;
    app_state.scheduler.stop();
    Ok(Json(app_state.scheduler.status().await))
}

async fn check_now(State(app_state): State<Arc<AppState>>) -> Result<Json<CheckOutcome>, AppError> {
    Ok(Json(app_state.scheduler.check_now().await?))
}

async fn send_test_notification(
    State(app_state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    app_state.scheduler.send_test_notification().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_config(State(app_state): State<Arc<AppState>>) -> Json<MonitorConfig> {
    Json(app_state.scheduler.config().await)
}

async fn update_config(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ConfigPatch>,
) -> Result<Json<MonitorConfig>, AppError> {
    Ok(Json(app_state.scheduler.update_config(payload).await?))
}

async fn get_history(State(app_state): State<Arc<AppState>>) -> Json<Vec<RoundRecord>> {
    Json(app_state.scheduler.history())
}

async fn clear_history(State(app_state): State<Arc<AppState>>) -> StatusCode {
    app_state.scheduler.clear_history();
    StatusCode::NO_CONTENT
}

pub async fn get_sources() -> Json<Vec<OfficialSource>> {
    Json(official_sources())
}
