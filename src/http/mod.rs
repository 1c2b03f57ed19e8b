//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, span)
//!     → GET  /            page.rs
//!     → POST /led/{state} control.rs  → LedController::apply_token
//!     → GET  /led         status.rs
//!     → WS   /ws          websocket.rs → LedController::subscribe
//!     → response.rs (JSON bodies, error mapping)
//! ```

pub mod control;
pub mod page;
pub mod request;
pub mod response;
pub mod server;
pub mod status;
pub mod websocket;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ControlAck, ErrorBody, LedStatus};
pub use server::{AppState, HttpServer};
