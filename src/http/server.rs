//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, concurrency limit)
//! - Bind server to listener
//! - Graceful shutdown of the serve loop and open subscriptions

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::{limit::GlobalConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{LedConfig, SubscriberConfig};
use crate::device::LedController;
use crate::http::{control, page, request, status, websocket};
use crate::lifecycle::Shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<LedController>,
    pub subscribers: SubscriberConfig,
    pub shutdown: Shutdown,
}

/// HTTP server for the LED relay.
pub struct HttpServer {
    router: Router,
    config: LedConfig,
    controller: Arc<LedController>,
    shutdown: Shutdown,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Triggering `shutdown` stops the serve loop and closes every open
    /// subscription.
    pub fn new(config: LedConfig, shutdown: Shutdown) -> Self {
        let controller = Arc::new(LedController::with_send_timeout(Duration::from_millis(
            config.subscribers.send_timeout_ms,
        )));

        let state = AppState {
            controller: controller.clone(),
            subscribers: config.subscribers.clone(),
            shutdown: shutdown.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            controller,
            shutdown,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &LedConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(page::control_page))
            .route("/led", get(status::get_led))
            .route("/led/{state}", post(control::set_led))
            .route("/ws", get(websocket::ws_handler))
            .route("/healthz", get(status::get_health))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(request::set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(request::make_request_span))
                    .layer(request::propagate_request_id_layer())
                    .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(self.shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &LedConfig {
        &self.config
    }

    /// Shared controller, for callers that drive the LED in-process.
    pub fn controller(&self) -> Arc<LedController> {
        self.controller.clone()
    }
}
