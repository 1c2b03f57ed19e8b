//! LED relay library.
//!
//! Toggles an in-memory LED flag over HTTP and pushes every change to the
//! WebSocket observers connected at that moment.

pub mod broadcast;
pub mod config;
pub mod device;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::LedConfig;
pub use device::LedController;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
