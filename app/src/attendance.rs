//! Attendance verification tokens.
//!
//! Each registration gets a scannable token carrying the event id, the
//! attendee id, and the university registration number, serialized as JSON
//! and rendered as a QR code. The token proves nothing by itself; the scan
//! station verifies it against the ledger, so a forged or stale token is
//! refused there. Field names are part of the wire format scanners parse,
//! so they are pinned with serde renames.

use crate::error::{CheckInError, ServiceError};
use crate::types::{AttendeeId, EventId, RegistrationRecord};
use qrcode::QrCode;
use qrcode::render::svg;
use serde::{Deserialize, Serialize};

/// Scannable proof-of-registration payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationToken {
    /// Event the token admits to
    #[serde(rename = "eventId")]
    pub event_id: EventId,
    /// The registered attendee
    #[serde(rename = "userId")]
    pub user_id: AttendeeId,
    /// University registration number, for manual desk lookup
    #[serde(rename = "regNo")]
    pub reg_no: String,
}

impl VerificationToken {
    /// Issues a token for an active registration record
    #[must_use]
    pub fn issue(record: &RegistrationRecord) -> Self {
        Self {
            event_id: record.event_id,
            user_id: record.attendee_id,
            reg_no: record.profile.reg_no.clone(),
        }
    }

    /// Parses a scanned payload.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::MalformedToken`] when the payload is not a
    /// well-formed token (bad JSON, missing fields, wrong types).
    pub fn parse(payload: &[u8]) -> Result<Self, CheckInError> {
        serde_json::from_slice(payload).map_err(|e| CheckInError::MalformedToken(e.to_string()))
    }

    /// Checks the token against the scanning station's event.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::EventMismatch`] when the token was issued for
    /// a different event. A valid token for event A scanned at event B must
    /// never check anyone in anywhere.
    pub fn verify_for_event(&self, station_event: EventId) -> Result<(), CheckInError> {
        if self.event_id == station_event {
            Ok(())
        } else {
            Err(CheckInError::EventMismatch {
                token_event: self.event_id,
                station_event,
            })
        }
    }

    /// Serializes the token to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, ServiceError> {
        serde_json::to_string(self).map_err(|e| ServiceError::Serialization(e.to_string()))
    }

    /// Renders the token as an SVG QR code for display in the attendee app.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Serialization`] if encoding or QR generation
    /// fails.
    pub fn to_qr_svg(&self) -> Result<String, ServiceError> {
        let json = self.to_json()?;
        let code = QrCode::new(json.as_bytes())
            .map_err(|e| ServiceError::Serialization(e.to_string()))?;
        let svg = code
            .render::<svg::Color>()
            .min_dimensions(200, 200)
            .build();
        Ok(svg)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{AttendeeProfile, RegistrationId, RegistrationStatus};
    use chrono::Utc;

    fn record(event_id: EventId, attendee_id: AttendeeId) -> RegistrationRecord {
        RegistrationRecord {
            id: RegistrationId::new(),
            event_id,
            attendee_id,
            profile: AttendeeProfile {
                reg_no: "21CS042".to_string(),
                name: "Asha Rao".to_string(),
                branch: "CSE".to_string(),
                department: "Engineering".to_string(),
                phone: "9000000000".to_string(),
            },
            status: RegistrationStatus::Registered,
            registered_at: Utc::now(),
            checked_in_at: None,
        }
    }

    #[test]
    fn token_uses_pinned_field_names() {
        let token = VerificationToken::issue(&record(EventId::new(), AttendeeId::new()));
        let json = token.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value.get("eventId").is_some());
        assert!(value.get("userId").is_some());
        assert_eq!(value["regNo"], "21CS042");
        // Rust-side names must not leak onto the wire
        assert!(value.get("event_id").is_none());
    }

    #[test]
    fn parse_roundtrips_issued_tokens() {
        let token = VerificationToken::issue(&record(EventId::new(), AttendeeId::new()));
        let parsed = VerificationToken::parse(token.to_json().unwrap().as_bytes()).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn parse_refuses_garbage() {
        let err = VerificationToken::parse(b"not json at all").unwrap_err();
        assert!(matches!(err, CheckInError::MalformedToken(_)));

        // Well-formed JSON missing required fields is still malformed
        let err = VerificationToken::parse(br#"{"eventId": "zzz"}"#).unwrap_err();
        assert!(matches!(err, CheckInError::MalformedToken(_)));
    }

    #[test]
    fn verify_rejects_other_events() {
        let home = EventId::new();
        let other = EventId::new();
        let token = VerificationToken::issue(&record(home, AttendeeId::new()));

        assert!(token.verify_for_event(home).is_ok());
        let err = token.verify_for_event(other).unwrap_err();
        assert_eq!(err, CheckInError::EventMismatch {
            token_event: home,
            station_event: other,
        });
    }

    #[test]
    fn qr_render_produces_svg() {
        let token = VerificationToken::issue(&record(EventId::new(), AttendeeId::new()));
        let svg = token.to_qr_svg().unwrap();
        assert!(svg.contains("<svg"));
    }
}
