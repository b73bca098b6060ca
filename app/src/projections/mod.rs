//! Read-side projections and the stored-event codec.
//!
//! [`CampusEvent`] is the envelope every stored event travels in: one tagged
//! enum over both aggregates' actions, so any stream can be replayed without
//! knowing up front which aggregate wrote it. Projections fold those events
//! into read models; the roster is the only one we serve today.

use crate::aggregates::{LedgerAction, ModerationAction};
use crate::error::ServiceError;
use campushub_core::event::SerializedEvent;
use serde::{Deserialize, Serialize};

pub mod roster;

pub use roster::{RosterProjection, RosterRow};

/// Envelope for every event persisted by this application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CampusEvent {
    /// Event catalogue moderation event
    Moderation(ModerationAction),
    /// Registration ledger event
    Ledger(LedgerAction),
}

impl CampusEvent {
    /// Stable event type name, taken from the inner action
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Moderation(action) => action.kind(),
            Self::Ledger(action) => action.kind(),
        }
    }

    /// Encodes the event for the store.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Serialization`] if JSON encoding fails.
    pub fn serialize(&self) -> Result<SerializedEvent, ServiceError> {
        let data =
            serde_json::to_vec(self).map_err(|e| ServiceError::Serialization(e.to_string()))?;
        Ok(SerializedEvent::new(
            self.kind().to_string(),
            data,
            None,
        ))
    }

    /// Decodes a stored event.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Serialization`] if the payload does not decode
    /// as a [`CampusEvent`].
    pub fn deserialize(event: &SerializedEvent) -> Result<Self, ServiceError> {
        serde_json::from_slice(&event.data)
            .map_err(|e| ServiceError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::EventId;
    use chrono::Utc;

    #[test]
    fn stored_events_carry_their_kind() {
        let event = CampusEvent::Moderation(ModerationAction::EventApproved {
            event_id: EventId::new(),
            approved_at: Utc::now(),
        });

        let serialized = event.serialize().unwrap();
        assert_eq!(serialized.event_type, "EventApproved.v1");

        let back = CampusEvent::deserialize(&serialized).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn deserialize_refuses_foreign_payloads() {
        let stray = SerializedEvent::new("Mystery".to_string(), b"{}".to_vec(), None);
        assert!(CampusEvent::deserialize(&stray).is_err());
    }
}
