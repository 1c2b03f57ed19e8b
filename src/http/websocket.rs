//! `WS /ws`: push LED state to connected observers.
//!
//! # Responsibilities
//! - Complete the upgrade handshake with the client
//! - Register the connection and send the current state as its first frame
//! - Forward every broadcast as one text frame
//! - Deregister when the peer leaves, the transport fails or we shut down
//!
//! # Connection States
//! ```text
//! Handshaking ──upgrade ok──▶ Registered ──close / error / evicted / shutdown──▶ Closed
//!      │
//!      └──upgrade failed──▶ (nothing registered)
//! ```
//!
//! # Design Decisions
//! - Inbound frames carry no meaning and are discarded
//! - Ping/pong handled by axum
//! - Deregistration rides on `SubscriptionGuard`'s drop, so it happens on
//!   every exit path
//! - Every server-initiated close (eviction, shutdown) sends a Close frame
//! - The shutdown listener is taken before the upgrade, so a connection
//!   upgraded after the trigger still closes

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use std::future::Future;

use crate::broadcast::SubscriberId;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Why a subscription ended.
#[derive(Debug)]
enum CloseReason {
    PeerClosed,
    Transport(axum::Error),
    /// The registry dropped us after a failed send.
    Evicted,
    Shutdown,
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let limit = state.subscribers.max_subscribers;
    if state.controller.registry().len() >= limit {
        tracing::warn!(limit, "Refusing WebSocket upgrade, subscriber limit reached");
        return ApiError::TooManySubscribers(limit).into_response();
    }

    let shutdown = state.shutdown.wait();
    ws.on_failed_upgrade(|e| tracing::warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| handle_socket(socket, state, shutdown))
}

/// Drive one registered connection until it closes.
async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) {
    tokio::pin!(shutdown);
    let (guard, mut outbound) = state
        .controller
        .subscribe(state.subscribers.channel_capacity)
        .await;
    let id = guard.id();
    let (mut sender, mut receiver) = socket.split();

    tracing::info!(subscriber_id = %id, "Subscriber connected");

    let reason = loop {
        tokio::select! {
            queued = outbound.recv() => match queued {
                Some(text) => {
                    if let Err(e) = sender.send(Message::Text(text.into())).await {
                        break CloseReason::Transport(e);
                    }
                }
                None => {
                    let _ = sender.send(Message::Close(None)).await;
                    break CloseReason::Evicted;
                }
            },
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break CloseReason::PeerClosed,
                Some(Ok(_)) => {}
                Some(Err(e)) => break CloseReason::Transport(e),
            },
            _ = &mut shutdown => {
                let _ = sender.send(Message::Close(None)).await;
                break CloseReason::Shutdown;
            }
        }
    };

    drop(guard);
    log_close(id, &reason);
}

fn log_close(id: SubscriberId, reason: &CloseReason) {
    match reason {
        CloseReason::PeerClosed => tracing::info!(subscriber_id = %id, "Subscriber disconnected"),
        CloseReason::Transport(e) => {
            tracing::info!(subscriber_id = %id, error = %e, "Subscriber connection failed")
        }
        CloseReason::Evicted => tracing::warn!(subscriber_id = %id, "Subscriber evicted"),
        CloseReason::Shutdown => tracing::debug!(subscriber_id = %id, "Subscriber closed for shutdown"),
    }
}
