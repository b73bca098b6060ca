//! Registration ledger aggregate.
//!
//! One registration book per approved event: the admission policy (capacity,
//! closing time) copied at open time, plus the active records. Admission
//! enforces capacity and per-attendee uniqueness against a single state
//! snapshot; the service layer's version-checked append makes the
//! check-and-admit atomic under concurrency. Cancellation removes the record
//! outright, so the freed slot is immediately reusable and the attendee may
//! register again. Check-in is the terminal transition and is idempotent.

use crate::error::{IneligibleReason, LedgerError};
use crate::types::{
    AttendeeId, AttendeeProfile, Capacity, EventId, LedgerState, RegistrationBook, RegistrationId,
    RegistrationRecord, RegistrationStatus,
};
use campushub_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the registration ledger aggregate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LedgerAction {
    // Commands
    /// Open a registration book for an approved event
    OpenRegistration {
        /// Event the book admits for
        event_id: EventId,
        /// Capacity copied from the event document
        capacity: Option<Capacity>,
        /// No admissions after this instant (the event's end time)
        closes_at: DateTime<Utc>,
    },

    /// Close the book (event cancelled or deleted); records are retained
    CloseRegistration {
        /// Event whose book closes
        event_id: EventId,
    },

    /// Register an attendee, subject to capacity and uniqueness
    Register {
        /// Event to register for
        event_id: EventId,
        /// Registering attendee
        attendee_id: AttendeeId,
        /// Profile snapshot captured now
        profile: AttendeeProfile,
    },

    /// Cancel an active registration (removes the record, frees the slot)
    CancelRegistration {
        /// Event registered for
        event_id: EventId,
        /// Attendee cancelling
        attendee_id: AttendeeId,
    },

    /// Mark an attendee as present. Idempotent: a second scan is a no-op.
    CheckIn {
        /// Event being checked into
        event_id: EventId,
        /// Attendee presenting the token
        attendee_id: AttendeeId,
    },

    // Events
    /// A registration book was opened
    RegistrationOpened {
        /// Event the book admits for
        event_id: EventId,
        /// Capacity at open time
        capacity: Option<Capacity>,
        /// Closing instant
        closes_at: DateTime<Utc>,
        /// When opened
        opened_at: DateTime<Utc>,
    },

    /// A registration book was closed
    RegistrationClosed {
        /// Event whose book closed
        event_id: EventId,
        /// When closed
        closed_at: DateTime<Utc>,
    },

    /// An attendee was admitted
    AttendeeRegistered {
        /// Record identifier
        registration_id: RegistrationId,
        /// Event registered for
        event_id: EventId,
        /// Admitted attendee
        attendee_id: AttendeeId,
        /// Profile snapshot
        profile: AttendeeProfile,
        /// When registered
        registered_at: DateTime<Utc>,
    },

    /// A registration was cancelled (applies by removing the record)
    RegistrationCancelled {
        /// Event registered for
        event_id: EventId,
        /// Attendee who cancelled
        attendee_id: AttendeeId,
        /// When cancelled
        cancelled_at: DateTime<Utc>,
    },

    /// An attendee was checked in
    AttendeeCheckedIn {
        /// Event checked into
        event_id: EventId,
        /// Checked-in attendee
        attendee_id: AttendeeId,
        /// When checked in
        checked_in_at: DateTime<Utc>,
    },

    /// A command was refused (applied to state only, never appended)
    CommandRejected {
        /// Why the command was refused
        error: LedgerError,
    },
}

impl LedgerAction {
    /// Stable event type name for storage and logging
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::OpenRegistration { .. } => "OpenRegistration",
            Self::CloseRegistration { .. } => "CloseRegistration",
            Self::Register { .. } => "Register",
            Self::CancelRegistration { .. } => "CancelRegistration",
            Self::CheckIn { .. } => "CheckIn",
            Self::RegistrationOpened { .. } => "RegistrationOpened.v1",
            Self::RegistrationClosed { .. } => "RegistrationClosed.v1",
            Self::AttendeeRegistered { .. } => "AttendeeRegistered.v1",
            Self::RegistrationCancelled { .. } => "RegistrationCancelled.v1",
            Self::AttendeeCheckedIn { .. } => "AttendeeCheckedIn.v1",
            Self::CommandRejected { .. } => "CommandRejected",
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the ledger aggregate
#[derive(Clone)]
pub struct LedgerEnvironment {
    /// Clock for timestamps
    pub clock: Arc<dyn Clock>,
}

impl LedgerEnvironment {
    /// Creates a new `LedgerEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the registration ledger.
///
/// Commands validate against the current book snapshot and record the
/// resulting event into `state.recorded` for the service layer to append.
/// Capacity and uniqueness are both evaluated against the same snapshot.
#[derive(Clone, Debug)]
pub struct LedgerReducer;

impl LedgerReducer {
    /// Creates a new `LedgerReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Apply an event and buffer it for the service layer to append
    fn record(state: &mut LedgerState, event: LedgerAction) {
        Self::apply_event(state, &event);
        state.recorded.push(event);
    }

    /// Refuse a command: typed error into state, nothing recorded
    fn fail(state: &mut LedgerState, error: LedgerError) {
        Self::apply_event(state, &LedgerAction::CommandRejected { error });
    }

    fn validate_register(
        state: &LedgerState,
        event_id: &EventId,
        attendee_id: &AttendeeId,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let Some(book) = state.book(event_id) else {
            return Err(LedgerError::EventNotFound(*event_id));
        };
        if !book.open {
            return Err(LedgerError::Ineligible(IneligibleReason::RegistrationClosed));
        }
        // Admission requires strictly before the closing instant
        if now >= book.closes_at {
            return Err(LedgerError::Ineligible(IneligibleReason::EventEnded));
        }
        if book.records.contains_key(attendee_id) {
            return Err(LedgerError::DuplicateRegistration(*attendee_id));
        }
        // Capacity checked last, against the same snapshot as uniqueness
        if book.is_full() {
            return Err(LedgerError::CapacityExceeded(*event_id));
        }
        Ok(())
    }

    fn validate_cancel(
        state: &LedgerState,
        event_id: &EventId,
        attendee_id: &AttendeeId,
    ) -> Result<(), LedgerError> {
        let Some(book) = state.book(event_id) else {
            return Err(LedgerError::EventNotFound(*event_id));
        };
        if !book.records.contains_key(attendee_id) {
            return Err(LedgerError::RegistrationNotFound(*attendee_id));
        }
        Ok(())
    }

    /// Check-in verdict: `Ok(true)` = record the transition, `Ok(false)` =
    /// already attended, idempotent no-op.
    fn validate_check_in(
        state: &LedgerState,
        event_id: &EventId,
        attendee_id: &AttendeeId,
    ) -> Result<bool, LedgerError> {
        let Some(book) = state.book(event_id) else {
            return Err(LedgerError::UnknownRegistration(*attendee_id));
        };
        if !book.open {
            return Err(LedgerError::Ineligible(IneligibleReason::RegistrationClosed));
        }
        match book.records.get(attendee_id) {
            None => Err(LedgerError::UnknownRegistration(*attendee_id)),
            // A cancelled record is as good as absent, rendered code or not
            Some(record) if record.status == RegistrationStatus::Cancelled => {
                Err(LedgerError::UnknownRegistration(*attendee_id))
            },
            Some(record) if record.status == RegistrationStatus::Attended => Ok(false),
            Some(_) => Ok(true),
        }
    }

    /// Applies an event to state
    fn apply_event(state: &mut LedgerState, action: &LedgerAction) {
        match action {
            LedgerAction::RegistrationOpened {
                event_id,
                capacity,
                closes_at,
                ..
            } => {
                state
                    .books
                    .entry(*event_id)
                    .or_insert_with(|| RegistrationBook::new(*event_id, *capacity, *closes_at));
                state.last_error = None;
            },
            LedgerAction::RegistrationClosed { event_id, .. } => {
                if let Some(book) = state.books.get_mut(event_id) {
                    book.open = false;
                }
                state.last_error = None;
            },
            LedgerAction::AttendeeRegistered {
                registration_id,
                event_id,
                attendee_id,
                profile,
                registered_at,
            } => {
                if let Some(book) = state.books.get_mut(event_id) {
                    book.records.insert(*attendee_id, RegistrationRecord {
                        id: *registration_id,
                        event_id: *event_id,
                        attendee_id: *attendee_id,
                        profile: profile.clone(),
                        status: RegistrationStatus::Registered,
                        registered_at: *registered_at,
                        checked_in_at: None,
                    });
                }
                state.last_error = None;
            },
            LedgerAction::RegistrationCancelled {
                event_id,
                attendee_id,
                ..
            } => {
                if let Some(book) = state.books.get_mut(event_id) {
                    book.records.remove(attendee_id);
                }
                state.last_error = None;
            },
            LedgerAction::AttendeeCheckedIn {
                event_id,
                attendee_id,
                checked_in_at,
            } => {
                if let Some(record) = state
                    .books
                    .get_mut(event_id)
                    .and_then(|book| book.records.get_mut(attendee_id))
                {
                    // Terminal and write-once: a replayed duplicate must not move the timestamp
                    if record.status != RegistrationStatus::Attended {
                        record.status = RegistrationStatus::Attended;
                        record.checked_in_at = Some(*checked_in_at);
                    }
                }
                state.last_error = None;
            },
            LedgerAction::CommandRejected { error } => {
                state.last_error = Some(error.clone());
            },
            // Commands don't modify state
            LedgerAction::OpenRegistration { .. }
            | LedgerAction::CloseRegistration { .. }
            | LedgerAction::Register { .. }
            | LedgerAction::CancelRegistration { .. }
            | LedgerAction::CheckIn { .. } => {},
        }
    }
}

impl Default for LedgerReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for LedgerReducer {
    type State = LedgerState;
    type Action = LedgerAction;
    type Environment = LedgerEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            LedgerAction::OpenRegistration {
                event_id,
                capacity,
                closes_at,
            } => {
                // Idempotent: opening an already-open book changes nothing
                if state.book(&event_id).is_none() {
                    Self::record(state, LedgerAction::RegistrationOpened {
                        event_id,
                        capacity,
                        closes_at,
                        opened_at: env.clock.now(),
                    });
                } else {
                    state.last_error = None;
                }
                SmallVec::new()
            },

            LedgerAction::CloseRegistration { event_id } => {
                match state.book(&event_id) {
                    None => Self::fail(state, LedgerError::EventNotFound(event_id)),
                    // Idempotent: closing a closed book changes nothing
                    Some(book) if !book.open => state.last_error = None,
                    Some(_) => {
                        Self::record(state, LedgerAction::RegistrationClosed {
                            event_id,
                            closed_at: env.clock.now(),
                        });
                    },
                }
                SmallVec::new()
            },

            LedgerAction::Register {
                event_id,
                attendee_id,
                profile,
            } => {
                let now = env.clock.now();
                if let Err(error) = Self::validate_register(state, &event_id, &attendee_id, now) {
                    Self::fail(state, error);
                    return SmallVec::new();
                }

                Self::record(state, LedgerAction::AttendeeRegistered {
                    registration_id: RegistrationId::new(),
                    event_id,
                    attendee_id,
                    profile,
                    registered_at: now,
                });
                SmallVec::new()
            },

            LedgerAction::CancelRegistration {
                event_id,
                attendee_id,
            } => {
                if let Err(error) = Self::validate_cancel(state, &event_id, &attendee_id) {
                    Self::fail(state, error);
                    return SmallVec::new();
                }

                Self::record(state, LedgerAction::RegistrationCancelled {
                    event_id,
                    attendee_id,
                    cancelled_at: env.clock.now(),
                });
                SmallVec::new()
            },

            LedgerAction::CheckIn {
                event_id,
                attendee_id,
            } => {
                match Self::validate_check_in(state, &event_id, &attendee_id) {
                    Err(error) => Self::fail(state, error),
                    // Second scan of the same token: success, nothing recorded
                    Ok(false) => state.last_error = None,
                    Ok(true) => {
                        Self::record(state, LedgerAction::AttendeeCheckedIn {
                            event_id,
                            attendee_id,
                            checked_in_at: env.clock.now(),
                        });
                    },
                }
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
