//! Typed domain errors for the CampusHub backend.
//!
//! Every failure an operation can hit is a variant here, locally recoverable
//! and serializable (errors travel inside state and API envelopes). Write
//! conflicts are the only failures that get retried; business-rule failures
//! are surfaced to the caller as-is, with no partial state left behind.

use crate::types::{AttendeeId, EventId, EventStatus};
use campushub_core::event_bus::EventBusError;
use campushub_core::event_store::EventStoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an event refuses registrations right now
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IneligibleReason {
    /// The event is not approved (pending, rejected, or cancelled)
    #[error("event is not approved for registration")]
    NotApproved,
    /// The registration book was closed (event cancelled or deleted)
    #[error("registration is closed")]
    RegistrationClosed,
    /// The event has already ended
    #[error("event has already ended")]
    EventEnded,
}

/// Errors from the event moderation state machine
#[derive(Error, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ModerationError {
    /// No event with this id (never created, rejected, or deleted)
    #[error("event {0} not found")]
    NotFound(EventId),

    /// The event's status does not allow the requested transition
    #[error("cannot {action} an event in status {status:?}")]
    InvalidTransition {
        /// What was attempted ("approve", "reject", "cancel", "update")
        action: String,
        /// Current stored status
        status: EventStatus,
    },

    /// The actor is neither the event's organizer nor an admin
    #[error("only the organizer or an admin may do this")]
    Forbidden,

    /// End time not after start time, or update attempted after start
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// An event with this id already exists
    #[error("event {0} already exists")]
    AlreadyExists(EventId),

    /// Update command carried no fields to change
    #[error("no fields to update")]
    NothingToUpdate,
}

/// Errors from the registration ledger
#[derive(Error, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LedgerError {
    /// No registration book for this event
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// The event cannot accept this registration right now
    #[error("ineligible: {0}")]
    Ineligible(IneligibleReason),

    /// All slots are taken
    #[error("event {0} is at capacity")]
    CapacityExceeded(EventId),

    /// The attendee already holds an active registration for this event
    #[error("attendee {0} is already registered")]
    DuplicateRegistration(AttendeeId),

    /// No active registration to cancel
    #[error("no registration for attendee {0}")]
    RegistrationNotFound(AttendeeId),

    /// Check-in presented for an absent or cancelled registration
    #[error("no known registration for attendee {0}")]
    UnknownRegistration(AttendeeId),
}

/// Errors from the attendance verification protocol (token codec)
#[derive(Error, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CheckInError {
    /// Scanned payload is not a well-formed verification token
    #[error("malformed verification token: {0}")]
    MalformedToken(String),

    /// Token belongs to a different event than the scanning station
    #[error("token was issued for event {token_event}, not {station_event}")]
    EventMismatch {
        /// Event the token was issued for
        token_event: EventId,
        /// Event the scanner is checking people into
        station_event: EventId,
    },
}

/// Failure delivering a notification email
#[derive(Error, Debug)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Umbrella error for service-layer operations.
///
/// Domain variants are terminal for the request; store conflicts are retried
/// inside the service before ever surfacing here.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A moderation rule rejected the command
    #[error(transparent)]
    Moderation(#[from] ModerationError),

    /// A ledger rule rejected the command
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The verification token was rejected before reaching the ledger
    #[error(transparent)]
    CheckIn(#[from] CheckInError),

    /// Event store operation failed
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Event bus operation failed
    #[error("event bus error: {0}")]
    EventBus(#[from] EventBusError),

    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_readable_messages() {
        let id = EventId::new();
        let err = ModerationError::InvalidTransition {
            action: "approve".to_string(),
            status: EventStatus::Cancelled,
        };
        assert!(err.to_string().contains("approve"));
        assert!(
            LedgerError::CapacityExceeded(id)
                .to_string()
                .contains("capacity")
        );
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn domain_errors_roundtrip_through_json() {
        let err = LedgerError::Ineligible(IneligibleReason::RegistrationClosed);
        let json = serde_json::to_string(&err).unwrap();
        let back: LedgerError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
