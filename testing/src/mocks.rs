//! In-memory mock implementations of the environment and infrastructure traits.
//!
//! Fast, deterministic stand-ins for tests and local runs:
//! - [`FixedClock`]: always returns the same instant
//! - [`InMemoryEventStore`]: HashMap-backed store with real optimistic
//!   concurrency checks, so conflict-retry paths are exercised exactly as
//!   against a durable store
//! - [`InMemoryEventBus`]: broadcast-backed bus that also records every
//!   published event for assertions

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

use campushub_core::environment::Clock;
use campushub_core::event::SerializedEvent;
use campushub_core::event_bus::{EventBus, EventBusError, EventStream};
use campushub_core::event_store::{EventStore, EventStoreError};
use campushub_core::stream::{StreamId, Version};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

// ============================================================================
// Clock
// ============================================================================

/// Fixed clock for deterministic tests
///
/// Always returns the same time, making tests reproducible.
///
/// # Example
///
/// ```
/// use campushub_testing::mocks::FixedClock;
/// use campushub_core::environment::Clock;
/// use chrono::Utc;
///
/// let clock = FixedClock::new(Utc::now());
/// assert_eq!(clock.now(), clock.now());
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
///
/// # Panics
///
/// Panics if the hardcoded timestamp fails to parse, which never happens.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}

// ============================================================================
// Event store
// ============================================================================

/// In-memory event store with optimistic concurrency control.
///
/// Stream version equals the number of events in the stream, so a new stream
/// is at [`Version::INITIAL`] and each append advances it by the number of
/// events appended. `expected_version` mismatches fail with
/// [`EventStoreError::ConcurrencyConflict`] exactly like a durable store,
/// which lets tests drive the conflict-retry paths of the service layer.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<Mutex<HashMap<StreamId, Vec<SerializedEvent>>>>,
}

impl InMemoryEventStore {
    /// Create a new empty in-memory event store
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current version of a stream (0 for a stream with no events).
    #[must_use]
    pub fn version_of(&self, stream_id: &StreamId) -> Version {
        let streams = self.streams.lock().unwrap();
        Version::new(streams.get(stream_id).map_or(0, |e| e.len() as u64))
    }

    /// Number of streams with at least one event. Useful for assertions.
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.streams
            .lock()
            .unwrap()
            .values()
            .filter(|events| !events.is_empty())
            .count()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_events(
        &self,
        stream_id: StreamId,
        expected_version: Option<Version>,
        events: Vec<SerializedEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Version, EventStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut streams = self.streams.lock().unwrap();
            let stream = streams.entry(stream_id.clone()).or_default();
            let actual = Version::new(stream.len() as u64);

            if let Some(expected) = expected_version {
                if expected != actual {
                    return Err(EventStoreError::ConcurrencyConflict {
                        stream_id,
                        expected,
                        actual,
                    });
                }
            }

            stream.extend(events);
            Ok(Version::new(stream.len() as u64))
        })
    }

    fn load_events(
        &self,
        stream_id: StreamId,
        from_version: Option<Version>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SerializedEvent>, EventStoreError>> + Send + '_>>
    {
        Box::pin(async move {
            let streams = self.streams.lock().unwrap();
            let events = streams.get(&stream_id).cloned().unwrap_or_default();
            let skip = from_version.map_or(0, |v| usize::try_from(v.value()).unwrap_or(usize::MAX));
            Ok(events.into_iter().skip(skip).collect())
        })
    }
}

// ============================================================================
// Event bus
// ============================================================================

const CHANNEL_CAPACITY: usize = 256;

/// In-memory event bus backed by tokio broadcast channels.
///
/// Every published event is also recorded in an in-order log so tests can
/// assert on what was published without subscribing.
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<SerializedEvent>>>>,
    published: Arc<Mutex<Vec<(String, SerializedEvent)>>>,
}

impl InMemoryEventBus {
    /// Create a new empty in-memory event bus
    #[must_use]
    pub fn new() -> Self {
        Self {
            topics: Arc::new(Mutex::new(HashMap::new())),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All events published so far, with their topics, in publish order.
    #[must_use]
    pub fn published(&self) -> Vec<(String, SerializedEvent)> {
        self.published.lock().unwrap().clone()
    }

    /// Events published to one topic, in publish order.
    #[must_use]
    pub fn published_to(&self, topic: &str) -> Vec<SerializedEvent> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, e)| e.clone())
            .collect()
    }

    fn sender_for(&self, topic: &str) -> broadcast::Sender<SerializedEvent> {
        let mut topics = self.topics.lock().unwrap();
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = event.clone();
        Box::pin(async move {
            self.published
                .lock()
                .unwrap()
                .push((topic.clone(), event.clone()));

            // A send error only means no active subscribers, which is fine.
            let _ = self.sender_for(&topic).send(event);
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(ToString::to_string).collect();
        Box::pin(async move {
            let mut streams: Vec<EventStream> = Vec::with_capacity(topics.len());
            for topic in &topics {
                let rx = self.sender_for(topic).subscribe();
                let stream = futures::stream::unfold(rx, |mut rx| async move {
                    loop {
                        match rx.recv().await {
                            Ok(event) => return Some((Ok(event), rx)),
                            Err(broadcast::error::RecvError::Lagged(_)) => {},
                            Err(broadcast::error::RecvError::Closed) => return None,
                        }
                    }
                });
                streams.push(Box::pin(stream));
            }
            Ok(Box::pin(futures::stream::select_all(streams)) as EventStream)
        })
    }
}
