//! Liveness check, mounted at the root rather than under `/api/v1`.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the database answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Receivers on the event bus. Zero means push fan-out is not running.
    pub notification_dispatchers: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = masjid_db::health_check(&state.pool).await.is_ok();
    let notification_dispatchers = state.event_bus.receiver_count();

    if notification_dispatchers == 0 {
        tracing::debug!("Health check: no notification dispatcher attached");
    }

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        notification_dispatchers,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
