//! Push notification subsystem.
//!
//! # Data Flow
//! ```text
//! WS connection task
//!     → Subscriber::channel (bounded mpsc)
//!     → SubscriberRegistry::track (registered, guard held by the task)
//!
//! Control request
//!     → SubscriberRegistry::broadcast
//!     → try_send to each snapshot entry
//!     → failed entries deregistered after the pass
//! ```

pub mod registry;

pub use registry::{
    BroadcastReport, SendError, Subscriber, SubscriberId, SubscriberRegistry, SubscriptionGuard,
};
