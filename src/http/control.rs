//! `POST /led/{state}`: switch the LED and notify subscribers.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::http::response::{ApiError, ControlAck};
use crate::http::server::AppState;

pub async fn set_led(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ControlAck>, ApiError> {
    let outcome = state.controller.apply_token(&token).await?;

    Ok(Json(ControlAck {
        status: format!("LED turned {}", outcome.command),
    }))
}
