//! CampusHub application façade.
//!
//! One entry point the HTTP layer talks to. The coordinator owns both
//! aggregate services and stitches their workflows together: moderation
//! decisions open and close registration books, registration produces
//! verification tokens, check-in verifies tokens against the ledger.

use crate::aggregates::ledger::LedgerEnvironment;
use crate::aggregates::moderation::ModerationEnvironment;
use crate::aggregates::{LedgerAction, ModerationAction};
use crate::app::services::{LedgerService, ModerationService};
use crate::attendance::VerificationToken;
use crate::error::{IneligibleReason, LedgerError, ModerationError, ServiceError};
use crate::notifier::Notifier;
use crate::projections::RosterProjection;
use crate::types::{
    Actor, AttendeeId, AttendeeProfile, Capacity, Event, EventId, EventStatus, Organizer,
    RegistrationRecord,
};
use campushub_core::environment::Clock;
use campushub_core::event_bus::EventBus;
use campushub_core::event_store::EventStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Input for event submission
#[derive(Clone, Debug)]
pub struct NewEvent {
    /// Event title
    pub title: String,
    /// Long-form description
    pub description: String,
    /// Venue description
    pub location: String,
    /// Start time
    pub starts_at: DateTime<Utc>,
    /// End time
    pub ends_at: DateTime<Utc>,
    /// The organizing account
    pub organizer: Organizer,
    /// Attendance cap; `None` for unlimited
    pub capacity: Option<Capacity>,
    /// Discovery tags
    pub tags: Vec<String>,
}

/// Fields an update may change; `None` leaves the field alone
#[derive(Clone, Debug, Default)]
pub struct EventChanges {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New location
    pub location: Option<String>,
    /// New capacity
    pub capacity: Option<Capacity>,
    /// New tags
    pub tags: Option<Vec<String>>,
}

/// An event as readers see it: derived status joined with the live count
/// of active registrations from the event's book.
#[derive(Clone, Debug, PartialEq)]
pub struct EventView {
    /// The event document, status already derived for read time
    pub event: Event,
    /// Active registrations (registered or attended) in the event's book
    pub registered_count: usize,
}

/// Result of a token scan
#[derive(Clone, Debug, PartialEq)]
pub struct CheckInOutcome {
    /// The registration as it stands after the scan
    pub record: RegistrationRecord,
    /// `false` when the attendee was already checked in (repeat scan)
    pub newly_checked_in: bool,
}

/// Application façade over moderation, ledger, attendance, and reporting.
pub struct CampusHub {
    moderation: ModerationService,
    ledger: LedgerService,
    clock: Arc<dyn Clock>,
}

impl CampusHub {
    /// Wires the services onto a store and bus
    #[must_use]
    pub fn new(
        event_store: Arc<dyn EventStore>,
        event_bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let moderation = ModerationService::new(
            Arc::clone(&event_store),
            Arc::clone(&event_bus),
            ModerationEnvironment::new(Arc::clone(&clock), notifier),
        );
        let ledger = LedgerService::new(
            event_store,
            event_bus,
            LedgerEnvironment::new(Arc::clone(&clock)),
        );
        Self {
            moderation,
            ledger,
            clock,
        }
    }

    // ========================================================================
    // Moderation workflows
    // ========================================================================

    /// Submits a new event. Club and faculty events await review; admin
    /// events go live immediately, registration book included.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Moderation`] for an invalid submission.
    pub async fn create_event(&self, new_event: NewEvent) -> Result<EventView, ServiceError> {
        let id = EventId::new();
        let recorded = self
            .moderation
            .execute(ModerationAction::CreateEvent {
                id,
                title: new_event.title,
                description: new_event.description,
                location: new_event.location,
                starts_at: new_event.starts_at,
                ends_at: new_event.ends_at,
                organizer: new_event.organizer,
                capacity: new_event.capacity,
                tags: new_event.tags,
            })
            .await?;

        let Some(ModerationAction::EventCreated { event }) = recorded.into_iter().next() else {
            return Err(ServiceError::Serialization(
                "create produced no event".to_string(),
            ));
        };

        if event.status == EventStatus::Approved {
            self.open_book(&event).await?;
        }
        Ok(EventView {
            event,
            registered_count: 0,
        })
    }

    /// Approves a pending event and opens its registration book.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Moderation`] if the event is missing or not
    /// pending.
    pub async fn approve_event(&self, event_id: EventId) -> Result<EventView, ServiceError> {
        self.moderation
            .execute(ModerationAction::Approve { event_id })
            .await?;
        let event = self.fetch_event(event_id).await?;
        self.open_book(&event).await?;
        self.with_count(event).await
    }

    /// Rejects a pending event. Destructive: the event is gone afterwards,
    /// as if never submitted.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Moderation`] if the event is missing or not
    /// pending.
    pub async fn reject_event(&self, event_id: EventId) -> Result<(), ServiceError> {
        self.moderation
            .execute(ModerationAction::Reject { event_id })
            .await?;
        Ok(())
    }

    /// Cancels an approved event and closes its book. Registrations are
    /// kept for the record; no new ones are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Moderation`] if the actor may not cancel or
    /// the event is not approved.
    pub async fn cancel_event(
        &self,
        event_id: EventId,
        actor: Actor,
    ) -> Result<EventView, ServiceError> {
        self.moderation
            .execute(ModerationAction::Cancel { event_id, actor })
            .await?;
        self.close_book(event_id).await?;
        self.get_event(event_id).await
    }

    /// Updates an approved event's details before it starts.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Moderation`] if the actor may not update, the
    /// event already started, or no fields were given.
    pub async fn update_event(
        &self,
        event_id: EventId,
        actor: Actor,
        changes: EventChanges,
    ) -> Result<EventView, ServiceError> {
        self.moderation
            .execute(ModerationAction::UpdateDetails {
                event_id,
                actor,
                title: changes.title,
                description: changes.description,
                location: changes.location,
                capacity: changes.capacity,
                tags: changes.tags,
            })
            .await?;
        self.get_event(event_id).await
    }

    /// Deletes an event outright and closes its book if one was opened.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Moderation`] if the actor may not delete.
    pub async fn delete_event(&self, event_id: EventId, actor: Actor) -> Result<(), ServiceError> {
        self.moderation
            .execute(ModerationAction::Delete { event_id, actor })
            .await?;
        self.close_book(event_id).await?;
        Ok(())
    }

    /// Lists the catalogue, ordered by start time. Statuses are as readers
    /// see them: approved events past their end read as `Completed`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the catalogue cannot be loaded.
    pub async fn list_events(&self) -> Result<Vec<EventView>, ServiceError> {
        let state = self.moderation.load_state().await?;
        let now = self.clock.now();
        let mut events: Vec<Event> = state
            .events
            .into_values()
            .map(|mut event| {
                event.status = event.effective_status(now);
                event
            })
            .collect();
        events.sort_by_key(|event| event.starts_at);

        let mut views = Vec::with_capacity(events.len());
        for event in events {
            views.push(self.with_count(event).await?);
        }
        Ok(views)
    }

    /// Fetches one event, with its read-time status and registration count.
    ///
    /// # Errors
    ///
    /// Returns [`ModerationError::NotFound`] for unknown, rejected, or
    /// deleted events.
    pub async fn get_event(&self, event_id: EventId) -> Result<EventView, ServiceError> {
        let event = self.fetch_event(event_id).await?;
        self.with_count(event).await
    }

    /// The event document alone, status derived for read time
    async fn fetch_event(&self, event_id: EventId) -> Result<Event, ServiceError> {
        let state = self.moderation.load_state().await?;
        let mut event = state
            .get(&event_id)
            .cloned()
            .ok_or(ModerationError::NotFound(event_id))?;
        event.status = event.effective_status(self.clock.now());
        Ok(event)
    }

    /// Joins the event with its book's live registration count
    async fn with_count(&self, event: Event) -> Result<EventView, ServiceError> {
        let state = self.ledger.load_state(event.id).await?;
        let registered_count = state
            .book(&event.id)
            .map_or(0, |book| book.registered_count());
        Ok(EventView {
            event,
            registered_count,
        })
    }

    // ========================================================================
    // Registration workflows
    // ========================================================================

    /// Registers an attendee for an approved, not-yet-ended event.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Ledger`] when the event is unknown, not open
    /// for registration, full, or the attendee is already registered.
    pub async fn register(
        &self,
        event_id: EventId,
        attendee_id: AttendeeId,
        profile: AttendeeProfile,
    ) -> Result<RegistrationRecord, ServiceError> {
        // Eligibility gate against the catalogue before touching the book
        let state = self.moderation.load_state().await?;
        let Some(event) = state.get(&event_id) else {
            return Err(LedgerError::EventNotFound(event_id).into());
        };
        match event.effective_status(self.clock.now()) {
            EventStatus::Approved => {},
            EventStatus::Completed => {
                return Err(LedgerError::Ineligible(IneligibleReason::EventEnded).into());
            },
            EventStatus::Pending | EventStatus::Rejected | EventStatus::Cancelled => {
                return Err(LedgerError::Ineligible(IneligibleReason::NotApproved).into());
            },
        }

        self.ledger
            .execute(event_id, LedgerAction::Register {
                event_id,
                attendee_id,
                profile,
            })
            .await?;

        self.registration(event_id, attendee_id).await
    }

    /// Cancels an active registration, freeing the slot immediately.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::RegistrationNotFound`] when there is nothing
    /// to cancel.
    pub async fn cancel_registration(
        &self,
        event_id: EventId,
        attendee_id: AttendeeId,
    ) -> Result<(), ServiceError> {
        self.ledger
            .execute(event_id, LedgerAction::CancelRegistration {
                event_id,
                attendee_id,
            })
            .await?;
        Ok(())
    }

    /// Fetches one attendee's active registration.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::RegistrationNotFound`] when none exists.
    pub async fn registration(
        &self,
        event_id: EventId,
        attendee_id: AttendeeId,
    ) -> Result<RegistrationRecord, ServiceError> {
        let state = self.ledger.load_state(event_id).await?;
        state
            .record(&event_id, &attendee_id)
            .cloned()
            .ok_or_else(|| LedgerError::RegistrationNotFound(attendee_id).into())
    }

    // ========================================================================
    // Attendance workflows
    // ========================================================================

    /// Issues the verification token for an active registration.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::RegistrationNotFound`] when the attendee holds
    /// no registration for this event.
    pub async fn registration_token(
        &self,
        event_id: EventId,
        attendee_id: AttendeeId,
    ) -> Result<VerificationToken, ServiceError> {
        let record = self.registration(event_id, attendee_id).await?;
        Ok(VerificationToken::issue(&record))
    }

    /// Renders an attendee's verification token as an SVG QR code.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::RegistrationNotFound`] when the attendee holds
    /// no registration, or a serialization error from QR rendering.
    pub async fn registration_qr_svg(
        &self,
        event_id: EventId,
        attendee_id: AttendeeId,
    ) -> Result<String, ServiceError> {
        let token = self.registration_token(event_id, attendee_id).await?;
        token.to_qr_svg()
    }

    /// Verifies a scanned token payload and checks the attendee in.
    ///
    /// A token for another event is refused without touching any book. A
    /// repeat scan succeeds with `newly_checked_in: false`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::CheckIn`] for malformed or mismatched tokens
    /// and [`ServiceError::Ledger`] for unknown registrations.
    pub async fn check_in(
        &self,
        station_event: EventId,
        payload: &[u8],
    ) -> Result<CheckInOutcome, ServiceError> {
        let token = VerificationToken::parse(payload)?;
        token.verify_for_event(station_event)?;

        let recorded = self
            .ledger
            .execute(station_event, LedgerAction::CheckIn {
                event_id: station_event,
                attendee_id: token.user_id,
            })
            .await?;

        let record = self.registration(station_event, token.user_id).await?;
        Ok(CheckInOutcome {
            record,
            newly_checked_in: !recorded.is_empty(),
        })
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    /// Builds the attendance roster for an event.
    ///
    /// # Errors
    ///
    /// Returns [`ModerationError::NotFound`] for unknown events.
    pub async fn roster(&self, event_id: EventId) -> Result<RosterProjection, ServiceError> {
        // The event must exist even if nobody registered yet
        self.fetch_event(event_id).await?;
        let journal = self.ledger.load_journal(event_id).await?;
        Ok(RosterProjection::from_events(event_id, &journal))
    }

    /// Renders the attendance roster as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`ModerationError::NotFound`] for unknown events.
    pub async fn roster_csv(&self, event_id: EventId) -> Result<String, ServiceError> {
        Ok(self.roster(event_id).await?.to_csv())
    }

    // ========================================================================
    // Book lifecycle (moderation → ledger handoff)
    // ========================================================================

    async fn open_book(&self, event: &Event) -> Result<(), ServiceError> {
        self.ledger
            .execute(event.id, LedgerAction::OpenRegistration {
                event_id: event.id,
                capacity: event.capacity,
                closes_at: event.ends_at,
            })
            .await?;
        Ok(())
    }

    /// Closes the book; a book that was never opened (pending event deleted
    /// before approval) is fine.
    async fn close_book(&self, event_id: EventId) -> Result<(), ServiceError> {
        match self
            .ledger
            .execute(event_id, LedgerAction::CloseRegistration { event_id })
            .await
        {
            Ok(_) | Err(ServiceError::Ledger(LedgerError::EventNotFound(_))) => Ok(()),
            Err(error) => Err(error),
        }
    }
}
