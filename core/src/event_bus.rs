//! Event bus abstraction for change notification across aggregates.
//!
//! Events are persisted to the event store first (source of truth), then
//! published on the bus so projections and other interested parties can
//! react. Delivery is at-least-once; subscribers must be idempotent.
//!
//! # Topic Naming Convention
//!
//! Topics follow the pattern `campushub-{aggregate}`:
//! - `campushub-events` — moderation lifecycle events
//! - `campushub-ledger` — registration ledger events
//!
//! The bus is the change-notification stream: reads still go through
//! services against the store, subscription is an optional add-on for
//! fan-out (notification mail, live dashboards).

use crate::event::SerializedEvent;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to publish an event to a topic
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to subscribe to topics
    #[error("Subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe
        topics: Vec<String>,
        /// The reason for failure
        reason: String,
    },

    /// Failed to deserialize an event
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Generic error for other failures
    #[error("Event bus error: {0}")]
    Other(String),
}

/// Stream of events from subscriptions.
///
/// Each item is a `Result`: an event, or a transport/deserialization error
/// the subscriber may log and skip.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SerializedEvent, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// # Design Principles
///
/// - **Store first**: events are appended to the event store before publish
/// - **At-least-once**: subscribers may receive duplicates
/// - **Idempotency**: subscribers must tolerate duplicates
///
/// # Dyn Compatibility
///
/// Explicit `Pin<Box<dyn Future>>` returns keep the trait usable as
/// `Arc<dyn EventBus>` shared by services.
pub trait EventBus: Send + Sync {
    /// Publish an event to a topic.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the publish fails.
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to one or more topics and receive a merged stream of events.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if the subscription
    /// cannot be established.
    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;
}
