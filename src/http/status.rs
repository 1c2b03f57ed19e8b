//! Read-only status endpoints.

use axum::{extract::State, Json};

use crate::device::state_label;
use crate::http::response::{Health, LedStatus};
use crate::http::server::AppState;

/// `GET /led`
pub async fn get_led(State(state): State<AppState>) -> Json<LedStatus> {
    Json(LedStatus {
        state: state_label(state.controller.is_on()).to_string(),
        subscribers: state.controller.registry().len(),
    })
}

/// `GET /healthz`
pub async fn get_health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
