//! Live subscriber set with self-healing fan-out.
//!
//! # Responsibilities
//! - Hand out unique subscriber IDs for removal and tracing
//! - Track which push channels are currently believed live
//! - Deliver one message to every subscriber, pruning the ones that fail
//! - Guarantee deregistration when a connection task ends
//!
//! # Design Decisions
//! - The registry never owns a socket, only the sending half of a bounded
//!   channel drained by the connection task that does
//! - A failed send is the liveness signal; there is no retry
//! - A full buffer is backpressure, not failure: the send waits for room and
//!   only a peer that stays stalled past the send timeout is dropped
//! - Broadcast iterates a cloned snapshot and applies removals afterwards,
//!   so pruning never runs while a shard lock is held

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::join_all;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::SendTimeoutError};

use crate::observability::metrics;

/// Global atomic counter for subscriber IDs.
static SUBSCRIBER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        Self(SUBSCRIBER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Why a push to one subscriber failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// The connection task is gone; nobody drains the channel anymore.
    #[error("subscriber channel closed")]
    Closed,

    /// The outbound buffer stayed full for the whole send timeout.
    #[error("subscriber stalled")]
    Timeout,
}

/// Send capability for one connected peer.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<String>,
}

impl Subscriber {
    /// Create a subscriber and the receiver its connection task drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: SubscriberId::new(),
                tx,
            },
            rx,
        )
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Queue a message, waiting up to `timeout` for buffer space.
    pub async fn send(&self, message: &str, timeout: Duration) -> Result<(), SendError> {
        self.tx
            .send_timeout(message.to_owned(), timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Closed(_) => SendError::Closed,
                SendTimeoutError::Timeout(_) => SendError::Timeout,
            })
    }
}

/// Outcome of a single broadcast pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers the message was queued for.
    pub delivered: usize,
    /// Subscribers removed because their send failed.
    pub pruned: usize,
}

/// How long a broadcast waits on one subscriber's full buffer.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Thread-safe set of live subscribers.
#[derive(Debug, Clone)]
pub struct SubscriberRegistry {
    inner: Arc<DashMap<SubscriberId, Subscriber>>,
    send_timeout: Duration,
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::with_send_timeout(DEFAULT_SEND_TIMEOUT)
    }
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with a custom per-subscriber send timeout.
    pub fn with_send_timeout(send_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            send_timeout,
        }
    }

    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Add a subscriber to the broadcast set.
    pub fn register(&self, subscriber: Subscriber) {
        let id = subscriber.id();
        self.inner.insert(id, subscriber);
        metrics::record_subscriber_count(self.inner.len());
        tracing::debug!(subscriber_id = %id, total = self.inner.len(), "Subscriber registered");
    }

    /// Register a subscriber and return a guard that deregisters it on drop.
    pub fn track(&self, subscriber: Subscriber) -> SubscriptionGuard {
        let id = subscriber.id();
        self.register(subscriber);
        SubscriptionGuard {
            registry: self.clone(),
            id,
        }
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn deregister(&self, id: SubscriberId) -> bool {
        let removed = self.inner.remove(&id).is_some();
        if removed {
            metrics::record_subscriber_count(self.inner.len());
            tracing::debug!(subscriber_id = %id, total = self.inner.len(), "Subscriber deregistered");
        }
        removed
    }

    /// Push `message` to every registered subscriber.
    ///
    /// Sends run concurrently and independently: a failing subscriber is
    /// removed and the rest still receive the message. A slow subscriber
    /// delays the pass by at most the send timeout. Failures are never
    /// reported to the caller beyond the counts in the returned report.
    pub async fn broadcast(&self, message: &str) -> BroadcastReport {
        let snapshot: Vec<Subscriber> = self
            .inner
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let timeout = self.send_timeout;
        let results = join_all(snapshot.iter().map(|subscriber| async move {
            (subscriber.id(), subscriber.send(message, timeout).await)
        }))
        .await;

        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();

        for (id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(subscriber_id = %id, error = %e, "Dropping subscriber after failed send");
                    failed.push(id);
                }
            }
        }

        for id in failed {
            // The connection task may have deregistered it already.
            if self.deregister(id) {
                report.pruned += 1;
            }
        }

        metrics::record_broadcast(&report);
        report
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.inner.contains_key(&id)
    }

    /// IDs of every registered subscriber, in no particular order.
    pub fn ids(&self) -> Vec<SubscriberId> {
        self.inner.iter().map(|entry| *entry.key()).collect()
    }
}

/// Deregisters its subscriber when dropped, on every exit path of the
/// connection task that holds it.
#[derive(Debug)]
pub struct SubscriptionGuard {
    registry: SubscriberRegistry,
    id: SubscriberId,
}

impl SubscriptionGuard {
    /// Get the guarded subscriber's ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
        tracing::trace!(subscriber_id = %self.id, "Subscription closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_id_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        assert_ne!(id1, id2);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber_once() {
        let registry = SubscriberRegistry::new();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (sub, rx) = Subscriber::channel(8);
            registry.register(sub);
            receivers.push(rx);
        }

        let report = registry.broadcast("LED is on").await;
        assert_eq!(report, BroadcastReport { delivered: 3, pruned: 0 });

        for rx in &mut receivers {
            assert_eq!(rx.try_recv().unwrap(), "LED is on");
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn broken_subscriber_is_pruned_without_affecting_others() {
        let registry = SubscriberRegistry::new();
        let (s1, mut rx1) = Subscriber::channel(8);
        let (s2, rx2) = Subscriber::channel(8);
        let (s3, mut rx3) = Subscriber::channel(8);
        let broken = s2.id();
        registry.register(s1);
        registry.register(s2);
        registry.register(s3);

        drop(rx2);

        let report = registry.broadcast("LED is off").await;
        assert_eq!(report, BroadcastReport { delivered: 2, pruned: 1 });
        assert!(!registry.contains(broken));
        assert_eq!(registry.len(), 2);
        assert_eq!(rx1.try_recv().unwrap(), "LED is off");
        assert_eq!(rx3.try_recv().unwrap(), "LED is off");

        let report = registry.broadcast("LED is on").await;
        assert_eq!(report, BroadcastReport { delivered: 2, pruned: 0 });
    }

    #[tokio::test]
    async fn slow_reader_is_kept_through_a_burst() {
        let registry = SubscriberRegistry::new();
        let (sub, mut rx) = Subscriber::channel(1);
        let id = sub.id();
        registry.register(sub);

        let reader = tokio::spawn(async move {
            let mut seen = 0;
            while seen < 20 {
                if rx.recv().await.is_none() {
                    break;
                }
                seen += 1;
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            seen
        });

        for _ in 0..20 {
            let report = registry.broadcast("LED is on").await;
            assert_eq!(report, BroadcastReport { delivered: 1, pruned: 0 });
        }
        assert_eq!(reader.await.unwrap(), 20);
        assert!(registry.contains(id));
    }

    #[tokio::test]
    async fn stalled_subscriber_is_pruned_after_timeout() {
        let registry = SubscriberRegistry::with_send_timeout(Duration::from_millis(20));
        let (stalled, _stalled_rx) = Subscriber::channel(1);
        let (live, mut live_rx) = Subscriber::channel(8);
        let stalled_id = stalled.id();
        registry.register(stalled);
        registry.register(live);

        assert_eq!(registry.broadcast("LED is on").await.delivered, 2);
        let report = registry.broadcast("LED is off").await;
        assert_eq!(report, BroadcastReport { delivered: 1, pruned: 1 });
        assert!(!registry.contains(stalled_id));

        assert_eq!(live_rx.try_recv().unwrap(), "LED is on");
        assert_eq!(live_rx.try_recv().unwrap(), "LED is off");
    }

    #[test]
    fn deregister_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let (keep, _keep_rx) = Subscriber::channel(1);
        let (gone, _gone_rx) = Subscriber::channel(1);
        let id = gone.id();
        registry.register(keep);
        registry.register(gone);

        assert!(registry.deregister(id));
        assert!(!registry.deregister(id));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.ids().len(), 1);
    }

    #[test]
    fn guard_deregisters_on_drop() {
        let registry = SubscriberRegistry::new();
        let (sub, _rx) = Subscriber::channel(1);
        let guard = registry.track(sub);
        let id = guard.id();
        assert!(registry.contains(id));

        // A racing explicit removal must not trip the guard.
        registry.deregister(id);
        drop(guard);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn empty_broadcast_is_a_no_op() {
        let registry = SubscriberRegistry::new();
        assert_eq!(registry.broadcast("LED is on").await, BroadcastReport::default());
    }
}
