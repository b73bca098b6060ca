//! Event moderation aggregate.
//!
//! Manages the event lifecycle: creation into `Pending` (or straight to
//! `Approved` for admin organizers), admin review (approve / reject),
//! organizer cancellation, detail updates, and deletion. Rejection is
//! destructive: the event is removed entirely, as if never submitted.
//! `Completed` is a derived read-time status, never a stored transition.

use crate::error::ModerationError;
use crate::notifier::Notifier;
use crate::types::{
    Actor, Capacity, Event, EventId, EventStatus, ModerationState, Organizer,
};
use campushub_core::{
    SmallVec, async_effect, effect::Effect, environment::Clock, reducer::Reducer, smallvec,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the moderation aggregate.
///
/// Commands express intent and may be refused; events record what happened
/// and replay without side effects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ModerationAction {
    // Commands
    /// Submit a new event
    CreateEvent {
        /// Event identifier (caller-generated)
        id: EventId,
        /// Event title
        title: String,
        /// Long-form description
        description: String,
        /// Venue description
        location: String,
        /// Start time
        starts_at: DateTime<Utc>,
        /// End time (must be after `starts_at`)
        ends_at: DateTime<Utc>,
        /// The organizing account
        organizer: Organizer,
        /// Attendance cap; `None` for unlimited
        capacity: Option<Capacity>,
        /// Discovery tags
        tags: Vec<String>,
    },

    /// Approve a pending event (admin review)
    Approve {
        /// Event to approve
        event_id: EventId,
    },

    /// Reject a pending event. Destructive: removes the event entirely.
    Reject {
        /// Event to reject
        event_id: EventId,
    },

    /// Call off an approved event
    Cancel {
        /// Event to cancel
        event_id: EventId,
        /// Who is asking (organizer or admin)
        actor: Actor,
    },

    /// Update details of an approved event before it starts
    UpdateDetails {
        /// Event to update
        event_id: EventId,
        /// Who is asking (organizer or admin)
        actor: Actor,
        /// New title, if changing
        title: Option<String>,
        /// New description, if changing
        description: Option<String>,
        /// New location, if changing
        location: Option<String>,
        /// New capacity, if changing
        capacity: Option<Capacity>,
        /// New tags, if changing
        tags: Option<Vec<String>>,
    },

    /// Remove an event outright (organizer withdrawing, or admin cleanup)
    Delete {
        /// Event to delete
        event_id: EventId,
        /// Who is asking (organizer or admin)
        actor: Actor,
    },

    // Events
    /// An event was submitted
    EventCreated {
        /// The full event document as created
        event: Event,
    },

    /// A pending event was approved
    EventApproved {
        /// Approved event
        event_id: EventId,
        /// When approved
        approved_at: DateTime<Utc>,
    },

    /// A pending event was rejected (applies by removing the event)
    EventRejected {
        /// Rejected event
        event_id: EventId,
        /// When rejected
        rejected_at: DateTime<Utc>,
    },

    /// An approved event was called off
    EventCancelled {
        /// Cancelled event
        event_id: EventId,
        /// When cancelled
        cancelled_at: DateTime<Utc>,
    },

    /// Event details were changed
    EventUpdated {
        /// Updated event
        event_id: EventId,
        /// New title, if changed
        title: Option<String>,
        /// New description, if changed
        description: Option<String>,
        /// New location, if changed
        location: Option<String>,
        /// New capacity, if changed
        capacity: Option<Capacity>,
        /// New tags, if changed
        tags: Option<Vec<String>>,
        /// When updated
        updated_at: DateTime<Utc>,
    },

    /// An event was removed
    EventDeleted {
        /// Deleted event
        event_id: EventId,
        /// When deleted
        deleted_at: DateTime<Utc>,
    },

    /// A command was refused (applied to state only, never appended)
    CommandRejected {
        /// Why the command was refused
        error: ModerationError,
    },
}

impl ModerationAction {
    /// Stable event type name for storage and logging
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateEvent { .. } => "CreateEvent",
            Self::Approve { .. } => "Approve",
            Self::Reject { .. } => "Reject",
            Self::Cancel { .. } => "Cancel",
            Self::UpdateDetails { .. } => "UpdateDetails",
            Self::Delete { .. } => "Delete",
            Self::EventCreated { .. } => "EventCreated.v1",
            Self::EventApproved { .. } => "EventApproved.v1",
            Self::EventRejected { .. } => "EventRejected.v1",
            Self::EventCancelled { .. } => "EventCancelled.v1",
            Self::EventUpdated { .. } => "EventUpdated.v1",
            Self::EventDeleted { .. } => "EventDeleted.v1",
            Self::CommandRejected { .. } => "CommandRejected",
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the moderation aggregate
#[derive(Clone)]
pub struct ModerationEnvironment {
    /// Clock for timestamps
    pub clock: Arc<dyn Clock>,
    /// Organizer status notifications
    pub notifier: Arc<dyn Notifier>,
}

impl ModerationEnvironment {
    /// Creates a new `ModerationEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self { clock, notifier }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the moderation aggregate.
///
/// Commands validate against current state and, on success, record the
/// resulting event in `state.recorded` (the uncommitted-events buffer the
/// service appends). Timestamps live inside the events, so replay is
/// deterministic regardless of wall-clock time.
#[derive(Clone, Debug)]
pub struct ModerationReducer;

impl ModerationReducer {
    /// Creates a new `ModerationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Apply an event and buffer it for the service layer to append
    fn record(state: &mut ModerationState, event: ModerationAction) {
        Self::apply_event(state, &event);
        state.recorded.push(event);
    }

    /// Refuse a command: typed error into state, nothing recorded
    fn fail(state: &mut ModerationState, error: ModerationError) {
        Self::apply_event(state, &ModerationAction::CommandRejected { error });
    }

    /// Organizer status email effect for approve/reject decisions
    fn notify_effect(
        env: &ModerationEnvironment,
        organizer: Organizer,
        title: String,
        approved: bool,
    ) -> Effect<ModerationAction> {
        let notifier = Arc::clone(&env.notifier);
        async_effect! {
            if let Err(error) = notifier.event_status_email(&organizer, &title, approved).await {
                tracing::warn!(%error, event_title = %title, "status notification failed");
            }
            None
        }
    }

    fn validate_create(
        state: &ModerationState,
        id: &EventId,
        title: &str,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<(), ModerationError> {
        if state.exists(id) {
            return Err(ModerationError::AlreadyExists(*id));
        }
        if title.trim().is_empty() {
            return Err(ModerationError::InvalidSchedule(
                "event title cannot be empty".to_string(),
            ));
        }
        if ends_at <= starts_at {
            return Err(ModerationError::InvalidSchedule(
                "event must end after it starts".to_string(),
            ));
        }
        Ok(())
    }

    /// Approve and reject are review decisions: Pending only
    fn validate_review<'a>(
        state: &'a ModerationState,
        event_id: &EventId,
        action: &str,
    ) -> Result<&'a Event, ModerationError> {
        let Some(event) = state.get(event_id) else {
            return Err(ModerationError::NotFound(*event_id));
        };
        if event.status != EventStatus::Pending {
            return Err(ModerationError::InvalidTransition {
                action: action.to_string(),
                status: event.status,
            });
        }
        Ok(event)
    }

    fn validate_cancel<'a>(
        state: &'a ModerationState,
        event_id: &EventId,
        actor: &Actor,
    ) -> Result<&'a Event, ModerationError> {
        let Some(event) = state.get(event_id) else {
            return Err(ModerationError::NotFound(*event_id));
        };
        if !actor.may_manage(event) {
            return Err(ModerationError::Forbidden);
        }
        if event.status != EventStatus::Approved {
            return Err(ModerationError::InvalidTransition {
                action: "cancel".to_string(),
                status: event.status,
            });
        }
        Ok(event)
    }

    fn validate_update(
        state: &ModerationState,
        event_id: &EventId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<(), ModerationError> {
        let Some(event) = state.get(event_id) else {
            return Err(ModerationError::NotFound(*event_id));
        };
        if !actor.may_manage(event) {
            return Err(ModerationError::Forbidden);
        }
        if event.status != EventStatus::Approved {
            return Err(ModerationError::InvalidTransition {
                action: "update".to_string(),
                status: event.status,
            });
        }
        if now >= event.starts_at {
            return Err(ModerationError::InvalidSchedule(
                "event has already started".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_delete(
        state: &ModerationState,
        event_id: &EventId,
        actor: &Actor,
    ) -> Result<(), ModerationError> {
        let Some(event) = state.get(event_id) else {
            return Err(ModerationError::NotFound(*event_id));
        };
        if !actor.may_manage(event) {
            return Err(ModerationError::Forbidden);
        }
        Ok(())
    }

    /// Applies an event to state
    fn apply_event(state: &mut ModerationState, action: &ModerationAction) {
        match action {
            ModerationAction::EventCreated { event } => {
                state.events.insert(event.id, event.clone());
                state.last_error = None;
            },
            ModerationAction::EventApproved {
                event_id,
                approved_at,
            } => {
                if let Some(event) = state.events.get_mut(event_id) {
                    event.status = EventStatus::Approved;
                    event.updated_at = *approved_at;
                }
                state.last_error = None;
            },
            ModerationAction::EventRejected { event_id, .. }
            | ModerationAction::EventDeleted { event_id, .. } => {
                state.events.remove(event_id);
                state.last_error = None;
            },
            ModerationAction::EventCancelled {
                event_id,
                cancelled_at,
            } => {
                if let Some(event) = state.events.get_mut(event_id) {
                    event.status = EventStatus::Cancelled;
                    event.updated_at = *cancelled_at;
                }
                state.last_error = None;
            },
            ModerationAction::EventUpdated {
                event_id,
                title,
                description,
                location,
                capacity,
                tags,
                updated_at,
            } => {
                if let Some(event) = state.events.get_mut(event_id) {
                    if let Some(title) = title {
                        event.title = title.clone();
                    }
                    if let Some(description) = description {
                        event.description = description.clone();
                    }
                    if let Some(location) = location {
                        event.location = location.clone();
                    }
                    if let Some(capacity) = capacity {
                        event.capacity = Some(*capacity);
                    }
                    if let Some(tags) = tags {
                        event.tags = tags.clone();
                    }
                    event.updated_at = *updated_at;
                }
                state.last_error = None;
            },
            ModerationAction::CommandRejected { error } => {
                state.last_error = Some(error.clone());
            },
            // Commands don't modify state
            ModerationAction::CreateEvent { .. }
            | ModerationAction::Approve { .. }
            | ModerationAction::Reject { .. }
            | ModerationAction::Cancel { .. }
            | ModerationAction::UpdateDetails { .. }
            | ModerationAction::Delete { .. } => {},
        }
    }
}

impl Default for ModerationReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for ModerationReducer {
    type State = ModerationState;
    type Action = ModerationAction;
    type Environment = ModerationEnvironment;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            ModerationAction::CreateEvent {
                id,
                title,
                description,
                location,
                starts_at,
                ends_at,
                organizer,
                capacity,
                tags,
            } => {
                if let Err(error) = Self::validate_create(state, &id, &title, starts_at, ends_at) {
                    Self::fail(state, error);
                    return SmallVec::new();
                }

                // Admin organizers are trusted: their events skip review.
                let status = if organizer.is_admin() {
                    EventStatus::Approved
                } else {
                    EventStatus::Pending
                };
                let now = env.clock.now();
                let event = Event {
                    id,
                    title,
                    description,
                    location,
                    starts_at,
                    ends_at,
                    organizer,
                    capacity,
                    status,
                    tags,
                    created_at: now,
                    updated_at: now,
                };
                Self::record(state, ModerationAction::EventCreated { event });
                SmallVec::new()
            },

            ModerationAction::Approve { event_id } => {
                let (organizer, title) = match Self::validate_review(state, &event_id, "approve") {
                    Ok(event) => (event.organizer.clone(), event.title.clone()),
                    Err(error) => {
                        Self::fail(state, error);
                        return SmallVec::new();
                    },
                };

                Self::record(state, ModerationAction::EventApproved {
                    event_id,
                    approved_at: env.clock.now(),
                });
                smallvec![Self::notify_effect(env, organizer, title, true)]
            },

            ModerationAction::Reject { event_id } => {
                let (organizer, title) = match Self::validate_review(state, &event_id, "reject") {
                    Ok(event) => (event.organizer.clone(), event.title.clone()),
                    Err(error) => {
                        Self::fail(state, error);
                        return SmallVec::new();
                    },
                };

                Self::record(state, ModerationAction::EventRejected {
                    event_id,
                    rejected_at: env.clock.now(),
                });
                smallvec![Self::notify_effect(env, organizer, title, false)]
            },

            ModerationAction::Cancel { event_id, actor } => {
                if let Err(error) = Self::validate_cancel(state, &event_id, &actor) {
                    Self::fail(state, error);
                    return SmallVec::new();
                }

                Self::record(state, ModerationAction::EventCancelled {
                    event_id,
                    cancelled_at: env.clock.now(),
                });
                SmallVec::new()
            },

            ModerationAction::UpdateDetails {
                event_id,
                actor,
                title,
                description,
                location,
                capacity,
                tags,
            } => {
                let now = env.clock.now();
                if let Err(error) = Self::validate_update(state, &event_id, &actor, now) {
                    Self::fail(state, error);
                    return SmallVec::new();
                }
                if title.is_none()
                    && description.is_none()
                    && location.is_none()
                    && capacity.is_none()
                    && tags.is_none()
                {
                    Self::fail(state, ModerationError::NothingToUpdate);
                    return SmallVec::new();
                }

                Self::record(state, ModerationAction::EventUpdated {
                    event_id,
                    title,
                    description,
                    location,
                    capacity,
                    tags,
                    updated_at: now,
                });
                SmallVec::new()
            },

            ModerationAction::Delete { event_id, actor } => {
                if let Err(error) = Self::validate_delete(state, &event_id, &actor) {
                    Self::fail(state, error);
                    return SmallVec::new();
                }

                Self::record(state, ModerationAction::EventDeleted {
                    event_id,
                    deleted_at: env.clock.now(),
                });
                SmallVec::new()
            },

            // ========== Events (from event store replay) ==========
            event => {
                Self::apply_event(state, &event);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notifier::RecordingNotifier;
    use crate::types::{OrganizerId, OrganizerType};
    use campushub_testing::{ReducerTest, assertions, mocks::test_clock};
    use chrono::Duration;

    fn create_test_env() -> ModerationEnvironment {
        ModerationEnvironment::new(Arc::new(test_clock()), Arc::new(RecordingNotifier::new()))
    }

    fn club_organizer() -> Organizer {
        Organizer::new(
            OrganizerId::new(),
            OrganizerType::Club,
            "Robotics Club".to_string(),
        )
    }

    fn admin_organizer() -> Organizer {
        Organizer::new(OrganizerId::new(), OrganizerType::Admin, "Admin".to_string())
    }

    fn create_action(id: EventId, organizer: Organizer) -> ModerationAction {
        let start = test_clock().now() + Duration::days(7);
        ModerationAction::CreateEvent {
            id,
            title: "Tech Symposium".to_string(),
            description: "Annual tech symposium".to_string(),
            location: "Main Auditorium".to_string(),
            starts_at: start,
            ends_at: start + Duration::hours(4),
            organizer,
            capacity: Capacity::new(100),
            tags: vec!["tech".to_string()],
        }
    }

    fn state_with_event(id: EventId, organizer: Organizer, status: EventStatus) -> ModerationState {
        let mut state = ModerationState::new();
        let reducer = ModerationReducer::new();
        reducer.reduce(&mut state, create_action(id, organizer), &create_test_env());
        if let Some(event) = state.events.get_mut(&id) {
            event.status = status;
        }
        let _ = state.take_recorded();
        state
    }

    #[test]
    fn club_created_event_starts_pending() {
        let id = EventId::new();

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(ModerationState::new())
            .when_action(create_action(id, club_organizer()))
            .then_state(move |state| {
                let event = state.get(&id).unwrap();
                assert_eq!(event.status, EventStatus::Pending);
                assert_eq!(state.recorded.len(), 1);
                assert!(state.last_error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn admin_created_event_skips_review() {
        let id = EventId::new();

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(ModerationState::new())
            .when_action(create_action(id, admin_organizer()))
            .then_state(move |state| {
                assert_eq!(state.get(&id).unwrap().status, EventStatus::Approved);
            })
            .run();
    }

    #[test]
    fn create_rejects_inverted_schedule() {
        let id = EventId::new();
        let start = test_clock().now() + Duration::days(7);

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(ModerationState::new())
            .when_action(ModerationAction::CreateEvent {
                id,
                title: "Backwards".to_string(),
                description: String::new(),
                location: "Lab".to_string(),
                starts_at: start,
                ends_at: start - Duration::hours(1),
                organizer: club_organizer(),
                capacity: None,
                tags: vec![],
            })
            .then_state(move |state| {
                assert!(!state.exists(&id));
                assert!(matches!(
                    state.last_error,
                    Some(ModerationError::InvalidSchedule(_))
                ));
                assert!(state.recorded.is_empty());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn approve_pending_event_notifies_organizer() {
        let id = EventId::new();

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state_with_event(id, club_organizer(), EventStatus::Pending))
            .when_action(ModerationAction::Approve { event_id: id })
            .then_state(move |state| {
                assert_eq!(state.get(&id).unwrap().status, EventStatus::Approved);
                assert!(matches!(
                    state.recorded.as_slice(),
                    [ModerationAction::EventApproved { .. }]
                ));
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn approve_requires_pending() {
        let id = EventId::new();

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state_with_event(id, club_organizer(), EventStatus::Approved))
            .when_action(ModerationAction::Approve { event_id: id })
            .then_state(move |state| {
                assert!(matches!(
                    state.last_error,
                    Some(ModerationError::InvalidTransition { .. })
                ));
                assert!(state.recorded.is_empty());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn approve_missing_event_not_found() {
        let id = EventId::new();

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(ModerationState::new())
            .when_action(ModerationAction::Approve { event_id: id })
            .then_state(move |state| {
                assert_eq!(state.last_error, Some(ModerationError::NotFound(id)));
            })
            .run();
    }

    #[test]
    fn reject_removes_event_entirely() {
        let id = EventId::new();

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state_with_event(id, club_organizer(), EventStatus::Pending))
            .when_action(ModerationAction::Reject { event_id: id })
            .then_state(move |state| {
                assert!(!state.exists(&id));
                assert!(matches!(
                    state.recorded.as_slice(),
                    [ModerationAction::EventRejected { .. }]
                ));
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn reject_after_approval_is_invalid() {
        let id = EventId::new();

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state_with_event(id, club_organizer(), EventStatus::Approved))
            .when_action(ModerationAction::Reject { event_id: id })
            .then_state(move |state| {
                assert!(state.exists(&id));
                assert!(matches!(
                    state.last_error,
                    Some(ModerationError::InvalidTransition { .. })
                ));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn organizer_can_cancel_approved_event() {
        let id = EventId::new();
        let organizer = club_organizer();
        let actor = Actor::new(organizer.id, OrganizerType::Club);

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state_with_event(id, organizer, EventStatus::Approved))
            .when_action(ModerationAction::Cancel {
                event_id: id,
                actor,
            })
            .then_state(move |state| {
                assert_eq!(state.get(&id).unwrap().status, EventStatus::Cancelled);
            })
            .run();
    }

    #[test]
    fn stranger_cannot_cancel() {
        let id = EventId::new();
        let actor = Actor::new(OrganizerId::new(), OrganizerType::Faculty);

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state_with_event(id, club_organizer(), EventStatus::Approved))
            .when_action(ModerationAction::Cancel {
                event_id: id,
                actor,
            })
            .then_state(move |state| {
                assert_eq!(state.get(&id).unwrap().status, EventStatus::Approved);
                assert_eq!(state.last_error, Some(ModerationError::Forbidden));
            })
            .run();
    }

    #[test]
    fn cancel_requires_approved_status() {
        let id = EventId::new();
        let organizer = club_organizer();
        let actor = Actor::new(organizer.id, OrganizerType::Club);

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state_with_event(id, organizer, EventStatus::Pending))
            .when_action(ModerationAction::Cancel {
                event_id: id,
                actor,
            })
            .then_state(move |state| {
                assert!(matches!(
                    state.last_error,
                    Some(ModerationError::InvalidTransition { .. })
                ));
            })
            .run();
    }

    #[test]
    fn update_changes_details_before_start() {
        let id = EventId::new();
        let organizer = club_organizer();
        let actor = Actor::new(organizer.id, OrganizerType::Club);

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state_with_event(id, organizer, EventStatus::Approved))
            .when_action(ModerationAction::UpdateDetails {
                event_id: id,
                actor,
                title: Some("Tech Symposium 2025".to_string()),
                description: None,
                location: None,
                capacity: Capacity::new(150),
                tags: None,
            })
            .then_state(move |state| {
                let event = state.get(&id).unwrap();
                assert_eq!(event.title, "Tech Symposium 2025");
                assert_eq!(event.capacity, Capacity::new(150));
                assert_eq!(event.status, EventStatus::Approved);
            })
            .run();
    }

    #[test]
    fn update_pending_event_is_invalid() {
        let id = EventId::new();
        let organizer = club_organizer();
        let actor = Actor::new(organizer.id, OrganizerType::Club);

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state_with_event(id, organizer, EventStatus::Pending))
            .when_action(ModerationAction::UpdateDetails {
                event_id: id,
                actor,
                title: Some("New".to_string()),
                description: None,
                location: None,
                capacity: None,
                tags: None,
            })
            .then_state(move |state| {
                assert!(matches!(
                    state.last_error,
                    Some(ModerationError::InvalidTransition { .. })
                ));
            })
            .run();
    }

    #[test]
    fn update_after_start_is_refused() {
        let id = EventId::new();
        let organizer = club_organizer();
        let actor = Actor::new(organizer.id, OrganizerType::Club);
        let mut state = state_with_event(id, organizer, EventStatus::Approved);
        // Move the event into the past relative to the fixed clock
        if let Some(event) = state.events.get_mut(&id) {
            event.starts_at = test_clock().now() - Duration::hours(1);
        }

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state)
            .when_action(ModerationAction::UpdateDetails {
                event_id: id,
                actor,
                title: Some("Too late".to_string()),
                description: None,
                location: None,
                capacity: None,
                tags: None,
            })
            .then_state(move |state| {
                assert!(matches!(
                    state.last_error,
                    Some(ModerationError::InvalidSchedule(_))
                ));
            })
            .run();
    }

    #[test]
    fn update_with_no_fields_is_refused() {
        let id = EventId::new();
        let organizer = club_organizer();
        let actor = Actor::new(organizer.id, OrganizerType::Club);

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state_with_event(id, organizer, EventStatus::Approved))
            .when_action(ModerationAction::UpdateDetails {
                event_id: id,
                actor,
                title: None,
                description: None,
                location: None,
                capacity: None,
                tags: None,
            })
            .then_state(|state| {
                assert_eq!(state.last_error, Some(ModerationError::NothingToUpdate));
            })
            .run();
    }

    #[test]
    fn admin_can_delete_any_event() {
        let id = EventId::new();
        let actor = Actor::new(OrganizerId::new(), OrganizerType::Admin);

        ReducerTest::new(ModerationReducer::new())
            .with_env(create_test_env())
            .given_state(state_with_event(id, club_organizer(), EventStatus::Approved))
            .when_action(ModerationAction::Delete {
                event_id: id,
                actor,
            })
            .then_state(move |state| {
                assert!(!state.exists(&id));
            })
            .run();
    }

    #[test]
    fn replayed_events_apply_without_effects() {
        let id = EventId::new();
        let mut state = ModerationState::new();
        let reducer = ModerationReducer::new();
        let env = create_test_env();

        reducer.reduce(&mut state, create_action(id, club_organizer()), &env);
        let recorded = state.take_recorded();

        // Replay into a fresh state: same result, no effects, nothing re-recorded
        let mut replayed = ModerationState::new();
        for event in recorded {
            let effects = reducer.reduce(&mut replayed, event, &env);
            assert!(effects.is_empty());
        }
        assert!(replayed.recorded.is_empty());
        assert_eq!(replayed.get(&id).unwrap().status, EventStatus::Pending);
    }
}
