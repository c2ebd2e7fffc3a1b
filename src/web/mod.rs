use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::monitor::MonitorScheduler;

pub mod error;
pub mod routes;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: MonitorScheduler,
}

pub fn create_router(scheduler: MonitorScheduler) -> Router {
    let app_state = Arc::new(AppState { scheduler });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/monitor", routes::monitor_routes::create_monitor_router())
        .route("/api/sources", get(routes::monitor_routes::get_sources))
        .with_state(app_state)
        .layer(cors)
}
