//! Attendance roster projection.
//!
//! Folds one event's ledger stream into the roster organizers download:
//! one row per active registration, profile fields as captured at
//! registration time, check-in status and timestamp. Cancelled registrations
//! were removed from the stream's state, so they never appear.

use crate::aggregates::LedgerAction;
use crate::types::{AttendeeId, EventId, RegistrationStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// One roster line, as shown on screen and exported to CSV
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RosterRow {
    /// University registration number
    pub reg_no: String,
    /// Attendee name at registration time
    pub name: String,
    /// Branch of study
    pub branch: String,
    /// Department
    pub department: String,
    /// Contact phone number
    pub phone: String,
    /// When the attendee registered
    pub registered_at: DateTime<Utc>,
    /// Registered or Attended
    pub status: RegistrationStatus,
    /// When the attendee checked in, if they did
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// Roster read model for a single event.
#[derive(Clone, Debug, Default)]
pub struct RosterProjection {
    entries: HashMap<AttendeeId, RosterRow>,
}

impl RosterProjection {
    /// Creates an empty roster
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a roster by folding one event's ledger stream
    #[must_use]
    pub fn from_events<'a, I>(event_id: EventId, events: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerAction>,
    {
        let mut roster = Self::new();
        for event in events {
            roster.apply(event_id, event);
        }
        roster
    }

    /// Folds one ledger event into the roster
    pub fn apply(&mut self, event_id: EventId, event: &LedgerAction) {
        match event {
            LedgerAction::AttendeeRegistered {
                event_id: id,
                attendee_id,
                profile,
                registered_at,
                ..
            } if *id == event_id => {
                self.entries.insert(*attendee_id, RosterRow {
                    reg_no: profile.reg_no.clone(),
                    name: profile.name.clone(),
                    branch: profile.branch.clone(),
                    department: profile.department.clone(),
                    phone: profile.phone.clone(),
                    registered_at: *registered_at,
                    status: RegistrationStatus::Registered,
                    checked_in_at: None,
                });
            },
            LedgerAction::RegistrationCancelled {
                event_id: id,
                attendee_id,
                ..
            } if *id == event_id => {
                self.entries.remove(attendee_id);
            },
            LedgerAction::AttendeeCheckedIn {
                event_id: id,
                attendee_id,
                checked_in_at,
            } if *id == event_id => {
                if let Some(row) = self.entries.get_mut(attendee_id) {
                    row.status = RegistrationStatus::Attended;
                    row.checked_in_at = Some(*checked_in_at);
                }
            },
            _ => {},
        }
    }

    /// All rows, ordered by registration time
    #[must_use]
    pub fn rows(&self) -> Vec<RosterRow> {
        let mut rows: Vec<_> = self.entries.values().cloned().collect();
        rows.sort_by_key(|row| row.registered_at);
        rows
    }

    /// Only the rows that checked in
    #[must_use]
    pub fn attended_only(&self) -> Vec<RosterRow> {
        self.rows()
            .into_iter()
            .filter(|row| row.status == RegistrationStatus::Attended)
            .collect()
    }

    /// Number of active registrations
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the roster as CSV, header row included
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::from(
            "reg_no,name,branch,department,phone,registered_at,status,checked_in_at\n",
        );
        for row in self.rows() {
            let status = match row.status {
                RegistrationStatus::Registered => "registered",
                RegistrationStatus::Attended => "attended",
                RegistrationStatus::Cancelled => "cancelled",
            };
            let checked_in = row
                .checked_in_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                csv_field(&row.reg_no),
                csv_field(&row.name),
                csv_field(&row.branch),
                csv_field(&row.department),
                csv_field(&row.phone),
                row.registered_at.to_rfc3339(),
                status,
                checked_in,
            ));
        }
        out
    }
}

/// Quotes a CSV field when it contains a delimiter, quote, or newline
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{AttendeeProfile, RegistrationId};
    use chrono::Duration;

    fn profile(reg_no: &str, name: &str) -> AttendeeProfile {
        AttendeeProfile {
            reg_no: reg_no.to_string(),
            name: name.to_string(),
            branch: "ECE".to_string(),
            department: "Engineering".to_string(),
            phone: "9111111111".to_string(),
        }
    }

    fn registered(
        event_id: EventId,
        attendee_id: AttendeeId,
        reg_no: &str,
        name: &str,
        at: DateTime<Utc>,
    ) -> LedgerAction {
        LedgerAction::AttendeeRegistered {
            registration_id: RegistrationId::new(),
            event_id,
            attendee_id,
            profile: profile(reg_no, name),
            registered_at: at,
        }
    }

    #[test]
    fn roster_orders_rows_by_registration_time() {
        let event_id = EventId::new();
        let t0 = Utc::now();
        let events = vec![
            registered(event_id, AttendeeId::new(), "21CS002", "Bina", t0 + Duration::minutes(5)),
            registered(event_id, AttendeeId::new(), "21CS001", "Asha", t0),
        ];

        let roster = RosterProjection::from_events(event_id, &events);
        let rows = roster.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].reg_no, "21CS001");
        assert_eq!(rows[1].reg_no, "21CS002");
    }

    #[test]
    fn cancelled_registrations_never_appear() {
        let event_id = EventId::new();
        let attendee_id = AttendeeId::new();
        let events = vec![
            registered(event_id, attendee_id, "21CS001", "Asha", Utc::now()),
            LedgerAction::RegistrationCancelled {
                event_id,
                attendee_id,
                cancelled_at: Utc::now(),
            },
        ];

        let roster = RosterProjection::from_events(event_id, &events);
        assert!(roster.is_empty());
    }

    #[test]
    fn check_in_marks_the_row_attended() {
        let event_id = EventId::new();
        let attendee_id = AttendeeId::new();
        let scanned_at = Utc::now();
        let events = vec![
            registered(event_id, attendee_id, "21CS001", "Asha", Utc::now()),
            LedgerAction::AttendeeCheckedIn {
                event_id,
                attendee_id,
                checked_in_at: scanned_at,
            },
        ];

        let roster = RosterProjection::from_events(event_id, &events);
        let rows = roster.rows();
        assert_eq!(rows[0].status, RegistrationStatus::Attended);
        assert_eq!(rows[0].checked_in_at, Some(scanned_at));
        assert_eq!(roster.attended_only().len(), 1);
    }

    #[test]
    fn events_for_other_streams_are_ignored() {
        let event_id = EventId::new();
        let other = EventId::new();
        let events = vec![registered(other, AttendeeId::new(), "21CS001", "Asha", Utc::now())];

        let roster = RosterProjection::from_events(event_id, &events);
        assert!(roster.is_empty());
    }

    #[test]
    fn csv_has_header_and_quotes_awkward_fields() {
        let event_id = EventId::new();
        let events = vec![registered(
            event_id,
            AttendeeId::new(),
            "21CS001",
            "Rao, Asha",
            Utc::now(),
        )];

        let csv = RosterProjection::from_events(event_id, &events).to_csv();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "reg_no,name,branch,department,phone,registered_at,status,checked_in_at"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("\"Rao, Asha\""));
        assert!(row.ends_with("registered,"));
    }
}
