//! State changes and subscriptions against the shared LED state.
//!
//! # Responsibilities
//! - Validate control tokens and apply them to `LedState`
//! - Broadcast the resulting state to every subscriber
//! - Register new subscribers with a snapshot as their first message
//!
//! # Design Decisions
//! - One control lock orders "set + broadcast" against "register + snapshot",
//!   so a new subscriber always sees the snapshot first and the last
//!   broadcast always matches the final state
//! - The lock is async: a broadcast holds it while waiting for room in a
//!   slow subscriber's buffer, which throttles control requests instead of
//!   dropping the subscriber

use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::broadcast::{BroadcastReport, Subscriber, SubscriberRegistry, SubscriptionGuard};
use crate::device::command::{ControlError, LedCommand};
use crate::device::state::{state_message, LedState};
use crate::observability::metrics;

/// Result of an accepted control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlOutcome {
    pub command: LedCommand,
    pub report: BroadcastReport,
}

/// Owns the LED state and the subscribers watching it.
#[derive(Debug, Default)]
pub struct LedController {
    state: LedState,
    registry: SubscriberRegistry,
    control_lock: Mutex<()>,
}

impl LedController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller whose broadcasts wait at most `send_timeout` per subscriber.
    pub fn with_send_timeout(send_timeout: Duration) -> Self {
        Self {
            registry: SubscriberRegistry::with_send_timeout(send_timeout),
            ..Self::default()
        }
    }

    /// Current value of the flag.
    pub fn is_on(&self) -> bool {
        self.state.get()
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Parse `token` and apply it.
    ///
    /// An invalid token leaves the state untouched and broadcasts nothing.
    pub async fn apply_token(&self, token: &str) -> Result<ControlOutcome, ControlError> {
        match token.parse::<LedCommand>() {
            Ok(command) => Ok(self.apply(command).await),
            Err(e) => {
                metrics::record_control_request("invalid");
                tracing::warn!(token = %token, "Rejected control request");
                Err(e)
            }
        }
    }

    /// Set the flag and notify every subscriber.
    ///
    /// Identical consecutive commands each broadcast.
    pub async fn apply(&self, command: LedCommand) -> ControlOutcome {
        let _ordered = self.control_lock.lock().await;
        self.state.set(command.is_on());
        metrics::record_led_state(command.is_on());

        let report = self
            .registry
            .broadcast(&state_message(command.is_on()))
            .await;
        metrics::record_control_request("applied");
        tracing::info!(
            state = %command,
            delivered = report.delivered,
            pruned = report.pruned,
            "LED state changed"
        );

        ControlOutcome { command, report }
    }

    /// Register a new subscriber with the current state queued as its first
    /// message.
    pub async fn subscribe(
        &self,
        channel_capacity: usize,
    ) -> (SubscriptionGuard, mpsc::Receiver<String>) {
        let (subscriber, rx) = Subscriber::channel(channel_capacity);

        let _ordered = self.control_lock.lock().await;
        let snapshot = state_message(self.state.get());
        // Fresh channel with room for one message and a live receiver.
        if let Err(e) = subscriber.send(&snapshot, self.registry.send_timeout()).await {
            tracing::warn!(subscriber_id = %subscriber.id(), error = %e, "Failed to queue snapshot");
        }
        let guard = self.registry.track(subscriber);

        (guard, rx)
    }
}
