//! Aggregate services - command handlers that persist and publish events.
//!
//! A service is the imperative shell around one reducer:
//! 1. Load the stream and replay it through the reducer to rebuild state
//! 2. Reduce the incoming command against that state
//! 3. Append the recorded events with the observed version (optimistic
//!    concurrency); on conflict, reload and re-decide, bounded retries
//! 4. Publish the appended events and run the returned effects
//!
//! Business-rule refusals never reach the store: the reducer records nothing
//! and leaves a typed error in state, which the service returns as-is.

use crate::aggregates::ledger::LedgerEnvironment;
use crate::aggregates::moderation::ModerationEnvironment;
use crate::aggregates::{LedgerAction, LedgerReducer, ModerationAction, ModerationReducer};
use crate::error::ServiceError;
use crate::projections::CampusEvent;
use crate::types::{EventId, LedgerState, ModerationState};
use campushub_core::effect::Effect;
use campushub_core::event::SerializedEvent;
use campushub_core::event_bus::EventBus;
use campushub_core::event_store::{EventStore, EventStoreError};
use campushub_core::reducer::Reducer;
use campushub_core::stream::{StreamId, Version};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Topic for moderation lifecycle events
pub const MODERATION_TOPIC: &str = "campushub-events";

/// Topic for registration ledger events
pub const LEDGER_TOPIC: &str = "campushub-ledger";

/// The single stream holding the event catalogue
const MODERATION_STREAM: &str = "events";

/// Bounded retries for optimistic-concurrency conflicts
const MAX_ATTEMPTS: u32 = 3;

/// Stream id for one event's registration book
fn ledger_stream(event_id: EventId) -> StreamId {
    StreamId::new(format!("ledger-{event_id}"))
}

/// Runs effects returned by a reducer, after the append succeeded.
///
/// Our reducers use effects for fire-and-forget work (notifications), so a
/// feedback action is unexpected and only logged.
fn run_effect<A: Send + 'static>(effect: Effect<A>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        match effect {
            Effect::None => {},
            Effect::Parallel(effects) => {
                futures::future::join_all(effects.into_iter().map(run_effect)).await;
            },
            Effect::Sequential(effects) => {
                for inner in effects {
                    run_effect(inner).await;
                }
            },
            Effect::Delay { duration, .. } => {
                tokio::time::sleep(duration).await;
                tracing::debug!("delayed feedback action dropped");
            },
            Effect::Future(future) => {
                if future.await.is_some() {
                    tracing::debug!("effect feedback action dropped");
                }
            },
        }
    })
}

// ============================================================================
// Moderation service
// ============================================================================

/// Command handler for the event moderation aggregate.
///
/// The whole catalogue lives on one stream, so the service is also the read
/// path for event listings.
pub struct ModerationService {
    event_store: Arc<dyn EventStore>,
    event_bus: Arc<dyn EventBus>,
    reducer: ModerationReducer,
    env: ModerationEnvironment,
}

impl ModerationService {
    /// Creates a new moderation service
    #[must_use]
    pub fn new(
        event_store: Arc<dyn EventStore>,
        event_bus: Arc<dyn EventBus>,
        env: ModerationEnvironment,
    ) -> Self {
        Self {
            event_store,
            event_bus,
            reducer: ModerationReducer::new(),
            env,
        }
    }

    /// Rebuilds catalogue state from the stream
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the stream cannot be loaded or decoded.
    pub async fn load_state(&self) -> Result<ModerationState, ServiceError> {
        let (state, _) = self.replay().await?;
        Ok(state)
    }

    /// Handles a moderation command.
    ///
    /// Returns the events the command produced; an empty vector means the
    /// command was a no-op.
    ///
    /// # Errors
    ///
    /// Returns the reducer's typed refusal as [`ServiceError::Moderation`],
    /// or an infrastructure error from the store or bus.
    pub async fn execute(
        &self,
        action: ModerationAction,
    ) -> Result<Vec<ModerationAction>, ServiceError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (mut state, version) = self.replay().await?;

            let effects = self.reducer.reduce(&mut state, action.clone(), &self.env);
            let recorded = state.take_recorded();
            if recorded.is_empty() {
                if let Some(error) = state.last_error.take() {
                    return Err(error.into());
                }
                return Ok(vec![]);
            }

            let serialized = recorded
                .iter()
                .map(|event| CampusEvent::Moderation(event.clone()).serialize())
                .collect::<Result<Vec<_>, _>>()?;

            match self
                .event_store
                .append_events(
                    StreamId::new(MODERATION_STREAM),
                    Some(version),
                    serialized.clone(),
                )
                .await
            {
                Ok(new_version) => {
                    publish_all(&*self.event_bus, MODERATION_TOPIC, &serialized).await?;
                    for effect in effects {
                        run_effect(effect).await;
                    }
                    tracing::info!(
                        command = action.kind(),
                        events = recorded.len(),
                        version = %new_version,
                        "moderation command handled"
                    );
                    return Ok(recorded);
                },
                Err(EventStoreError::ConcurrencyConflict { .. }) if attempt < MAX_ATTEMPTS => {
                    tracing::debug!(command = action.kind(), attempt, "write conflict, retrying");
                },
                Err(error) => return Err(error.into()),
            }
        }
    }

    async fn replay(&self) -> Result<(ModerationState, Version), ServiceError> {
        let stored = self
            .event_store
            .load_events(StreamId::new(MODERATION_STREAM), None)
            .await?;
        let version = Version::new(stored.len() as u64);

        let mut state = ModerationState::new();
        for event in &stored {
            if let CampusEvent::Moderation(action) = CampusEvent::deserialize(event)? {
                self.reducer.reduce(&mut state, action, &self.env);
            }
        }
        Ok((state, version))
    }
}

// ============================================================================
// Ledger service
// ============================================================================

/// Command handler for the registration ledger.
///
/// Each event's registration book is its own stream, so a last-slot race on
/// one event conflicts only with writers to that same event.
pub struct LedgerService {
    event_store: Arc<dyn EventStore>,
    event_bus: Arc<dyn EventBus>,
    reducer: LedgerReducer,
    env: LedgerEnvironment,
}

impl LedgerService {
    /// Creates a new ledger service
    #[must_use]
    pub fn new(
        event_store: Arc<dyn EventStore>,
        event_bus: Arc<dyn EventBus>,
        env: LedgerEnvironment,
    ) -> Self {
        Self {
            event_store,
            event_bus,
            reducer: LedgerReducer::new(),
            env,
        }
    }

    /// Rebuilds one event's registration book from its stream
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the stream cannot be loaded or decoded.
    pub async fn load_state(&self, event_id: EventId) -> Result<LedgerState, ServiceError> {
        let (state, _) = self.replay(event_id).await?;
        Ok(state)
    }

    /// Loads one event's ledger events in order, for projections
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the stream cannot be loaded or decoded.
    pub async fn load_journal(&self, event_id: EventId) -> Result<Vec<LedgerAction>, ServiceError> {
        let stored = self
            .event_store
            .load_events(ledger_stream(event_id), None)
            .await?;

        let mut journal = Vec::with_capacity(stored.len());
        for event in &stored {
            if let CampusEvent::Ledger(action) = CampusEvent::deserialize(event)? {
                journal.push(action);
            }
        }
        Ok(journal)
    }

    /// Handles a ledger command against one event's book.
    ///
    /// Returns the events the command produced; an empty vector means the
    /// command was an idempotent no-op (for example a repeat check-in).
    ///
    /// # Errors
    ///
    /// Returns the reducer's typed refusal as [`ServiceError::Ledger`], or
    /// an infrastructure error from the store or bus.
    pub async fn execute(
        &self,
        event_id: EventId,
        action: LedgerAction,
    ) -> Result<Vec<LedgerAction>, ServiceError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (mut state, version) = self.replay(event_id).await?;

            let effects = self.reducer.reduce(&mut state, action.clone(), &self.env);
            let recorded = state.take_recorded();
            if recorded.is_empty() {
                if let Some(error) = state.last_error.take() {
                    return Err(error.into());
                }
                return Ok(vec![]);
            }

            let serialized = recorded
                .iter()
                .map(|event| CampusEvent::Ledger(event.clone()).serialize())
                .collect::<Result<Vec<_>, _>>()?;

            match self
                .event_store
                .append_events(ledger_stream(event_id), Some(version), serialized.clone())
                .await
            {
                Ok(new_version) => {
                    publish_all(&*self.event_bus, LEDGER_TOPIC, &serialized).await?;
                    for effect in effects {
                        run_effect(effect).await;
                    }
                    tracing::info!(
                        command = action.kind(),
                        %event_id,
                        events = recorded.len(),
                        version = %new_version,
                        "ledger command handled"
                    );
                    return Ok(recorded);
                },
                Err(EventStoreError::ConcurrencyConflict { .. }) if attempt < MAX_ATTEMPTS => {
                    tracing::debug!(
                        command = action.kind(),
                        %event_id,
                        attempt,
                        "write conflict, retrying"
                    );
                },
                Err(error) => return Err(error.into()),
            }
        }
    }

    async fn replay(&self, event_id: EventId) -> Result<(LedgerState, Version), ServiceError> {
        let stored = self
            .event_store
            .load_events(ledger_stream(event_id), None)
            .await?;
        let version = Version::new(stored.len() as u64);

        let mut state = LedgerState::new();
        for event in &stored {
            if let CampusEvent::Ledger(action) = CampusEvent::deserialize(event)? {
                self.reducer.reduce(&mut state, action, &self.env);
            }
        }
        Ok((state, version))
    }
}

/// Publishes appended events in order; store-first means a publish failure
/// after the append is surfaced but the events are already durable.
async fn publish_all(
    bus: &dyn EventBus,
    topic: &str,
    events: &[SerializedEvent],
) -> Result<(), ServiceError> {
    for event in events {
        bus.publish(topic, event).await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{LedgerError, ModerationError};
    use crate::notifier::RecordingNotifier;
    use crate::types::{AttendeeId, AttendeeProfile, Capacity, Organizer, OrganizerId, OrganizerType};
    use campushub_core::environment::Clock;
    use campushub_testing::{InMemoryEventBus, InMemoryEventStore, mocks::test_clock};
    use chrono::Duration;

    fn moderation_service(
        store: Arc<InMemoryEventStore>,
        bus: Arc<InMemoryEventBus>,
        notifier: Arc<RecordingNotifier>,
    ) -> ModerationService {
        ModerationService::new(
            store,
            bus,
            ModerationEnvironment::new(Arc::new(test_clock()), notifier),
        )
    }

    fn ledger_service(store: Arc<InMemoryEventStore>, bus: Arc<InMemoryEventBus>) -> LedgerService {
        LedgerService::new(store, bus, LedgerEnvironment::new(Arc::new(test_clock())))
    }

    fn create_action(id: EventId) -> ModerationAction {
        let start = test_clock().now() + Duration::days(7);
        ModerationAction::CreateEvent {
            id,
            title: "Hackathon".to_string(),
            description: "24h build night".to_string(),
            location: "Innovation Lab".to_string(),
            starts_at: start,
            ends_at: start + Duration::hours(24),
            organizer: Organizer::new(
                OrganizerId::new(),
                OrganizerType::Club,
                "Coding Club".to_string(),
            ),
            capacity: Capacity::new(40),
            tags: vec![],
        }
    }

    fn profile() -> AttendeeProfile {
        AttendeeProfile {
            reg_no: "21CS001".to_string(),
            name: "Asha Rao".to_string(),
            branch: "CSE".to_string(),
            department: "Engineering".to_string(),
            phone: "9000000000".to_string(),
        }
    }

    #[tokio::test]
    async fn execute_persists_publishes_and_notifies() {
        let store = Arc::new(InMemoryEventStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let service = moderation_service(store.clone(), bus.clone(), notifier.clone());

        let id = EventId::new();
        let recorded = service.execute(create_action(id)).await.unwrap();
        assert!(matches!(
            recorded.as_slice(),
            [ModerationAction::EventCreated { .. }]
        ));

        service
            .execute(ModerationAction::Approve { event_id: id })
            .await
            .unwrap();

        // Store is the source of truth: two events on the catalogue stream
        let stored = store
            .load_events(StreamId::new(MODERATION_STREAM), None)
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].event_type, "EventApproved.v1");

        // Published to the bus after the append
        assert_eq!(bus.published_to(MODERATION_TOPIC).len(), 2);

        // Approval effect ran the notification
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].approved);

        let state = service.load_state().await.unwrap();
        assert!(state.exists(&id));
    }

    #[tokio::test]
    async fn refusals_surface_without_touching_the_store() {
        let store = Arc::new(InMemoryEventStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let service = moderation_service(store.clone(), bus, Arc::new(RecordingNotifier::new()));

        let missing = EventId::new();
        let err = service
            .execute(ModerationAction::Approve { event_id: missing })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Moderation(ModerationError::NotFound(_))
        ));

        let stored = store
            .load_events(StreamId::new(MODERATION_STREAM), None)
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn ledger_streams_are_per_event() {
        let store = Arc::new(InMemoryEventStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let service = ledger_service(store.clone(), bus);

        let first = EventId::new();
        let second = EventId::new();
        let closes_at = test_clock().now() + Duration::days(7);
        for event_id in [first, second] {
            service
                .execute(event_id, LedgerAction::OpenRegistration {
                    event_id,
                    capacity: Capacity::new(1),
                    closes_at,
                })
                .await
                .unwrap();
        }

        service
            .execute(first, LedgerAction::Register {
                event_id: first,
                attendee_id: AttendeeId::new(),
                profile: profile(),
            })
            .await
            .unwrap();

        // The second event's book is untouched by the first's registrations
        let state = service.load_state(second).await.unwrap();
        assert_eq!(state.book(&second).unwrap().registered_count(), 0);
        assert_eq!(store.stream_count(), 2);
    }

    #[tokio::test]
    async fn idempotent_commands_append_nothing() {
        let store = Arc::new(InMemoryEventStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let service = ledger_service(store.clone(), bus);

        let event_id = EventId::new();
        let attendee_id = AttendeeId::new();
        let closes_at = test_clock().now() + Duration::days(7);
        service
            .execute(event_id, LedgerAction::OpenRegistration {
                event_id,
                capacity: None,
                closes_at,
            })
            .await
            .unwrap();
        service
            .execute(event_id, LedgerAction::Register {
                event_id,
                attendee_id,
                profile: profile(),
            })
            .await
            .unwrap();
        service
            .execute(event_id, LedgerAction::CheckIn {
                event_id,
                attendee_id,
            })
            .await
            .unwrap();

        // Repeat scan: Ok, but no new event recorded
        let recorded = service
            .execute(event_id, LedgerAction::CheckIn {
                event_id,
                attendee_id,
            })
            .await
            .unwrap();
        assert!(recorded.is_empty());

        let journal = service.load_journal(event_id).await.unwrap();
        assert_eq!(journal.len(), 3);
    }

    #[tokio::test]
    async fn capacity_refusal_is_typed() {
        let store = Arc::new(InMemoryEventStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let service = ledger_service(store, bus);

        let event_id = EventId::new();
        let closes_at = test_clock().now() + Duration::days(7);
        service
            .execute(event_id, LedgerAction::OpenRegistration {
                event_id,
                capacity: Capacity::new(1),
                closes_at,
            })
            .await
            .unwrap();
        service
            .execute(event_id, LedgerAction::Register {
                event_id,
                attendee_id: AttendeeId::new(),
                profile: profile(),
            })
            .await
            .unwrap();

        let err = service
            .execute(event_id, LedgerAction::Register {
                event_id,
                attendee_id: AttendeeId::new(),
                profile: profile(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::CapacityExceeded(_))
        ));
    }
}
