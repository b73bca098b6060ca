//! Domain types for the CampusHub backend.
//!
//! Value objects, entities, and aggregate state for the campus events system:
//! moderated events, registration books, and attendance records.

use crate::error::{LedgerError, ModerationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a campus event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an attendee (a student account)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendeeId(Uuid);

impl AttendeeId {
    /// Creates a new random `AttendeeId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `AttendeeId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AttendeeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttendeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an organizer (club, faculty, or admin account)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizerId(Uuid);

impl OrganizerId {
    /// Creates a new random `OrganizerId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrganizerId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrganizerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrganizerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a registration record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Creates a new random `RegistrationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `RegistrationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RegistrationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Capacity Value Object
// ============================================================================

/// Positive attendance capacity for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Capacity(u32);

impl Capacity {
    /// Creates a `Capacity`, rejecting zero
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    /// Returns the capacity value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Organizers and actors
// ============================================================================

/// Kind of account that can organize events or act on them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrganizerType {
    /// Student club account
    Club,
    /// Faculty account
    Faculty,
    /// Administrator account (trusted: events go live without review)
    Admin,
}

/// An event organizer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Organizer {
    /// Organizer account id
    pub id: OrganizerId,
    /// Kind of organizer
    pub organizer_type: OrganizerType,
    /// Display name shown on event pages and in status mail
    pub name: String,
}

impl Organizer {
    /// Creates a new `Organizer`
    #[must_use]
    pub const fn new(id: OrganizerId, organizer_type: OrganizerType, name: String) -> Self {
        Self {
            id,
            organizer_type,
            name,
        }
    }

    /// Whether this organizer's events skip moderation
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.organizer_type == OrganizerType::Admin
    }
}

/// The account issuing a command, for authorization checks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Acting account id
    pub id: OrganizerId,
    /// Role of the acting account
    pub role: OrganizerType,
}

impl Actor {
    /// Creates a new `Actor`
    #[must_use]
    pub const fn new(id: OrganizerId, role: OrganizerType) -> Self {
        Self { id, role }
    }

    /// Whether the actor holds the admin role
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == OrganizerType::Admin
    }

    /// Whether the actor may act on an event: its organizer, or any admin
    #[must_use]
    pub fn may_manage(&self, event: &Event) -> bool {
        self.is_admin() || self.id == event.organizer.id
    }
}

// ============================================================================
// Events
// ============================================================================

/// Moderation status of a campus event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    /// Awaiting admin review; invisible to attendees
    Pending,
    /// Live and open for registration
    Approved,
    /// Refused at review. The document is deleted on this transition, so
    /// the status is only ever observed in flight.
    Rejected,
    /// Approved event called off by its organizer or an admin
    Cancelled,
    /// Derived status: approved and past its end time. Never stored.
    Completed,
}

/// A campus event document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Event title
    pub title: String,
    /// Long-form description
    pub description: String,
    /// Venue description (free text)
    pub location: String,
    /// When the event starts
    pub starts_at: DateTime<Utc>,
    /// When the event ends (strictly after `starts_at`)
    pub ends_at: DateTime<Utc>,
    /// Who runs the event
    pub organizer: Organizer,
    /// Attendance cap; `None` means unlimited
    pub capacity: Option<Capacity>,
    /// Stored moderation status (`Completed` is derived, never stored here)
    pub status: EventStatus,
    /// Free-form tags for discovery
    pub tags: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Status as seen by readers: an approved event past its end time
    /// reads as `Completed` without any stored transition.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> EventStatus {
        if self.status == EventStatus::Approved && now > self.ends_at {
            EventStatus::Completed
        } else {
            self.status
        }
    }
}

// ============================================================================
// Registrations
// ============================================================================

/// Status of a registration record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// Holds a slot; eligible for check-in
    Registered,
    /// Checked in at the event; terminal
    Attended,
    /// Slot given up. The record is removed on this transition, so the
    /// status is only ever observed in flight.
    Cancelled,
}

/// Attendee details captured at registration time.
///
/// Immutable once captured: later profile edits do not rewrite history,
/// the roster shows what was true when the attendee registered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttendeeProfile {
    /// University registration number
    pub reg_no: String,
    /// Full name
    pub name: String,
    /// Branch of study
    pub branch: String,
    /// Department
    pub department: String,
    /// Contact phone number
    pub phone: String,
}

/// One attendee's registration for one event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Record identifier
    pub id: RegistrationId,
    /// The event registered for
    pub event_id: EventId,
    /// The registered attendee
    pub attendee_id: AttendeeId,
    /// Profile snapshot captured at registration
    pub profile: AttendeeProfile,
    /// Registered or Attended (cancelled records are deleted, not marked)
    pub status: RegistrationStatus,
    /// When the attendee registered
    pub registered_at: DateTime<Utc>,
    /// When the attendee checked in; set exactly once
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// Per-event registration book: the admission policy copied at open time
/// plus the live records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistrationBook {
    /// The event this book admits for
    pub event_id: EventId,
    /// Attendance cap copied from the event; `None` means unlimited
    pub capacity: Option<Capacity>,
    /// No admissions after this instant (the event's end time)
    pub closes_at: DateTime<Utc>,
    /// Whether the book accepts registrations and check-ins
    pub open: bool,
    /// Active records by attendee. Cancellation removes the entry, so
    /// every entry counts against capacity.
    pub records: HashMap<AttendeeId, RegistrationRecord>,
}

impl RegistrationBook {
    /// Creates an open book with the given admission policy
    #[must_use]
    pub fn new(event_id: EventId, capacity: Option<Capacity>, closes_at: DateTime<Utc>) -> Self {
        Self {
            event_id,
            capacity,
            closes_at,
            open: true,
            records: HashMap::new(),
        }
    }

    /// Number of active registrations (registered + attended)
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.records.len()
    }

    /// Whether one more admission would exceed capacity
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|cap| self.records.len() >= cap.value() as usize)
    }
}

// ============================================================================
// Aggregate state
// ============================================================================

/// State for the event moderation aggregate
#[derive(Clone, Debug, Default)]
pub struct ModerationState {
    /// Events by id. A rejected or deleted event is removed entirely.
    pub events: HashMap<EventId, Event>,
    /// Error from the last rejected command, if any
    pub last_error: Option<ModerationError>,
    /// Events produced by the current command, awaiting append.
    /// Drained by the service layer via [`ModerationState::take_recorded`].
    pub recorded: Vec<crate::aggregates::moderation::ModerationAction>,
}

impl ModerationState {
    /// Creates empty moderation state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an event by id
    #[must_use]
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.get(id)
    }

    /// Whether an event with this id exists
    #[must_use]
    pub fn exists(&self, id: &EventId) -> bool {
        self.events.contains_key(id)
    }

    /// Number of events
    #[must_use]
    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// Drain the uncommitted events produced by the last command
    pub fn take_recorded(&mut self) -> Vec<crate::aggregates::moderation::ModerationAction> {
        std::mem::take(&mut self.recorded)
    }
}

/// State for the registration ledger aggregate
#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    /// Registration books by event id
    pub books: HashMap<EventId, RegistrationBook>,
    /// Error from the last rejected command, if any
    pub last_error: Option<LedgerError>,
    /// Events produced by the current command, awaiting append.
    pub recorded: Vec<crate::aggregates::ledger::LedgerAction>,
}

impl LedgerState {
    /// Creates empty ledger state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the registration book for an event
    #[must_use]
    pub fn book(&self, event_id: &EventId) -> Option<&RegistrationBook> {
        self.books.get(event_id)
    }

    /// Look up one attendee's record for an event
    #[must_use]
    pub fn record(&self, event_id: &EventId, attendee_id: &AttendeeId) -> Option<&RegistrationRecord> {
        self.books
            .get(event_id)
            .and_then(|book| book.records.get(attendee_id))
    }

    /// Drain the uncommitted events produced by the last command
    pub fn take_recorded(&mut self) -> Vec<crate::aggregates::ledger::LedgerAction> {
        std::mem::take(&mut self.recorded)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn capacity_rejects_zero() {
        assert!(Capacity::new(0).is_none());
        assert_eq!(Capacity::new(40).unwrap().value(), 40);
    }

    #[test]
    fn effective_status_derives_completed() {
        let now = Utc::now();
        let organizer = Organizer::new(
            OrganizerId::new(),
            OrganizerType::Club,
            "Robotics Club".to_string(),
        );
        let mut event = Event {
            id: EventId::new(),
            title: "Tech Talk".to_string(),
            description: String::new(),
            location: "Auditorium".to_string(),
            starts_at: now - Duration::hours(3),
            ends_at: now - Duration::hours(1),
            organizer,
            capacity: None,
            status: EventStatus::Approved,
            tags: vec![],
            created_at: now - Duration::days(7),
            updated_at: now - Duration::days(7),
        };

        assert_eq!(event.effective_status(now), EventStatus::Completed);

        // Pending and cancelled events never read as completed
        event.status = EventStatus::Pending;
        assert_eq!(event.effective_status(now), EventStatus::Pending);
        event.status = EventStatus::Cancelled;
        assert_eq!(event.effective_status(now), EventStatus::Cancelled);
    }

    #[test]
    fn destructive_statuses_still_parse() {
        // Rejection and registration-cancellation delete their records, but
        // readers can still name the statuses (e.g. list query filters)
        let status: EventStatus = serde_json::from_str("\"Rejected\"").unwrap();
        assert_eq!(status, EventStatus::Rejected);
        let status: RegistrationStatus = serde_json::from_str("\"Cancelled\"").unwrap();
        assert_eq!(status, RegistrationStatus::Cancelled);
    }

    #[test]
    fn book_capacity_accounting() {
        let event_id = EventId::new();
        let mut book =
            RegistrationBook::new(event_id, Capacity::new(1), Utc::now() + Duration::hours(2));
        assert!(!book.is_full());

        let attendee = AttendeeId::new();
        book.records.insert(
            attendee,
            RegistrationRecord {
                id: RegistrationId::new(),
                event_id,
                attendee_id: attendee,
                profile: AttendeeProfile {
                    reg_no: "21CS001".to_string(),
                    name: "Asha".to_string(),
                    branch: "CSE".to_string(),
                    department: "Engineering".to_string(),
                    phone: "9000000000".to_string(),
                },
                status: RegistrationStatus::Registered,
                registered_at: Utc::now(),
                checked_in_at: None,
            },
        );

        assert!(book.is_full());
        assert_eq!(book.registered_count(), 1);
    }

    #[test]
    fn unlimited_capacity_never_fills() {
        let book = RegistrationBook::new(EventId::new(), None, Utc::now());
        assert!(!book.is_full());
    }
}
