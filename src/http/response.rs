//! Response bodies and error mapping.
//!
//! # Responsibilities
//! - JSON bodies for control and status endpoints
//! - Map domain errors to HTTP status codes and `{"error": ...}` payloads
//!
//! # Design Decisions
//! - Invalid tokens answer 400; the body stays `{"error": "Invalid state"}`
//! - Error payloads never echo client input

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::ControlError;

/// Acknowledgement for an accepted control request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAck {
    pub status: String,
}

/// Current device state and audience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedStatus {
    pub state: String,
    pub subscribers: usize,
}

/// Liveness check body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

/// Structured error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("subscriber limit of {0} reached")]
    TooManySubscribers(usize),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Control(_) => StatusCode::BAD_REQUEST,
            ApiError::TooManySubscribers(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            ApiError::Control(ControlError::InvalidStateToken(_)) => "Invalid state",
            ApiError::TooManySubscribers(_) => "Too many subscribers",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.public_message().to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
