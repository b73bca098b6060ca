//! Event store trait for appending and loading event streams.
//!
//! The store is deliberately minimal: append events to a stream with
//! optimistic concurrency, load them back for state reconstruction. It does
//! NOT manage projections or subscriptions (the event bus covers change
//! notification) and offers no querying beyond stream id.
//!
//! # Optimistic Concurrency
//!
//! `append_events` takes the version the caller last observed. If another
//! writer appended in between, the store refuses with
//! [`EventStoreError::ConcurrencyConflict`] and the caller reloads, replays,
//! and re-validates its command against fresh state. This is the mechanism
//! that keeps "check capacity, then admit" atomic for the registration
//! ledger: the loser of a last-slot race conflicts instead of overbooking.
//!
//! # Implementations
//!
//! `InMemoryEventStore` in `campushub-testing` is the deterministic
//! implementation the application and tests run against.

use crate::event::SerializedEvent;
use crate::stream::{StreamId, Version};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event store operations.
#[derive(Error, Debug)]
pub enum EventStoreError {
    /// Optimistic concurrency conflict: expected version doesn't match current version.
    ///
    /// Another writer appended to the stream between the caller's load and
    /// its append. The caller should reload and re-decide.
    #[error("Concurrency conflict: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The stream ID where the conflict occurred.
        stream_id: StreamId,
        /// The version we expected the stream to be at.
        expected: Version,
        /// The actual current version of the stream.
        actual: Version,
    },

    /// Stream not found in the event store.
    #[error("Stream not found: {0}")]
    StreamNotFound(StreamId),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Event store abstraction for storing and retrieving event streams.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to be shared across async tasks.
///
/// # Dyn Compatibility
///
/// The trait uses explicit `Pin<Box<dyn Future>>` returns instead of
/// `async fn` so it can be used as a trait object (`Arc<dyn EventStore>`)
/// captured by services and effects.
pub trait EventStore: Send + Sync {
    /// Append events to a stream with optimistic concurrency control.
    ///
    /// # Parameters
    ///
    /// - `stream_id`: the stream to append to
    /// - `expected_version`: `Some(version)` asserts the stream is currently
    ///   at that version; `None` appends unconditionally (use with caution)
    /// - `events`: events to persist, in order
    ///
    /// # Returns
    ///
    /// The new stream version after the append. A stream at version 5
    /// receiving 3 events ends at version 8.
    ///
    /// # Errors
    ///
    /// - [`EventStoreError::ConcurrencyConflict`]: version mismatch, a
    ///   concurrent writer got there first
    /// - [`EventStoreError::StorageError`]: the backend failed
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use campushub_core::event_store::EventStore;
    /// use campushub_core::stream::{StreamId, Version};
    ///
    /// async fn append_example<E: EventStore>(store: &E) -> Result<(), Box<dyn std::error::Error>> {
    ///     let stream_id = StreamId::new("ledger-42");
    ///     let events = vec![/* events */];
    ///
    ///     // First append to a new stream
    ///     let v = store.append_events(stream_id.clone(), Some(Version::INITIAL), events).await?;
    ///
    ///     // Subsequent appends state the version they observed
    ///     let _ = store.append_events(stream_id, Some(v), vec![]).await?;
    ///     Ok(())
    /// }
    /// ```
    fn append_events(
        &self,
        stream_id: StreamId,
        expected_version: Option<Version>,
        events: Vec<SerializedEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Version, EventStoreError>> + Send + '_>>;

    /// Load events from a stream, ordered by version (oldest first).
    ///
    /// `from_version`: `Some(v)` loads events from that version onwards
    /// (inclusive); `None` loads the whole stream. A stream that doesn't
    /// exist yet yields an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// - [`EventStoreError::StorageError`]: the backend failed
    fn load_events(
        &self,
        stream_id: StreamId,
        from_version: Option<Version>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SerializedEvent>, EventStoreError>> + Send + '_>>;
}
