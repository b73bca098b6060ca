//! Event trait and serialized wire format for event sourcing.
//!
//! Events are immutable facts: `EventApproved`, `AttendeeRegistered`,
//! `AttendeeCheckedIn`. Replaying a stream of them rebuilds aggregate state
//! deterministically, which is why every timestamp a fact needs lives inside
//! the fact itself rather than being re-read from a clock on replay.
//!
//! # Serialization
//!
//! Events are serialized with `serde_json`. JSON keeps the store contents
//! inspectable and matches the wire format the HTTP layer and the
//! verification tokens already use, so the whole system has one codec.

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Error types for event serialization.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),

    /// Unknown event type encountered during deserialization.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
}

/// An event that can be stored in an event store and replayed to rebuild state.
///
/// # Event Naming Convention
///
/// `event_type()` returns a stable identifier with a version suffix so event
/// schemas can evolve:
///
/// - `"EventApproved.v1"`
/// - `"AttendeeRegistered.v1"`
///
/// # Example
///
/// ```
/// use campushub_core::event::Event;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// enum ModerationEvent {
///     Approved { event_id: String },
///     Rejected { event_id: String },
/// }
///
/// impl Event for ModerationEvent {
///     fn event_type(&self) -> &'static str {
///         match self {
///             ModerationEvent::Approved { .. } => "EventApproved.v1",
///             ModerationEvent::Rejected { .. } => "EventRejected.v1",
///         }
///     }
/// }
/// ```
pub trait Event: Send + Sync + 'static {
    /// Returns the stable event type identifier for this event.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be
    /// serialized (rare with serde_json and plain data enums).
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the bytes are corrupted,
    /// belong to a different event type, or the schema changed incompatibly.
    fn from_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        serde_json::from_slice(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

/// A serialized event ready for storage.
///
/// Carries the event type name, the serialized payload, and optional
/// metadata. This is the wire format between the application and the event
/// store / event bus.
#[derive(Clone, Debug, PartialEq)]
pub struct SerializedEvent {
    /// The event type identifier (e.g., "EventApproved.v1").
    pub event_type: String,

    /// The JSON-serialized event data.
    pub data: Vec<u8>,

    /// Optional metadata.
    ///
    /// Common fields: `correlation_id` (links related events across
    /// aggregates), `user_id` (who triggered the event).
    pub metadata: Option<serde_json::Value>,
}

impl SerializedEvent {
    /// Create a new serialized event.
    #[must_use]
    pub const fn new(
        event_type: String,
        data: Vec<u8>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            data,
            metadata,
        }
    }

    /// Create a serialized event from an [`Event`] value.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    pub fn from_event<E: Event + Serialize>(
        event: &E,
        metadata: Option<serde_json::Value>,
    ) -> Result<Self, EventError> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            data: event.to_bytes()?,
            metadata,
        })
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedEvent {{ type: {}, size: {} bytes }}",
            self.event_type,
            self.data.len()
        )
    }
}
