//! Check-in endpoint for scan stations.
//!
//! - POST /api/events/:id/check-in - Verify a scanned token and mark attendance
//!
//! The body is the raw token payload exactly as scanned (the JSON the QR
//! code encodes). The station's event id comes from the path, so a token
//! issued for another event is refused before any ledger lookup.

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::types::{EventId, RegistrationStatus};
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Result of a scan
#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    /// Attendee's registration number, for the steward's screen
    pub reg_no: String,
    /// Attendee name
    pub name: String,
    /// Always `Attended` after a successful scan
    pub status: RegistrationStatus,
    /// When this attendee was first checked in
    pub checked_in_at: Option<DateTime<Utc>>,
    /// `false` when this was a repeat scan of the same token
    pub newly_checked_in: bool,
}

/// Verify a scanned token and check the attendee in.
///
/// Idempotent: rescanning a used token succeeds and reports
/// `newly_checked_in: false` without recording anything.
pub async fn check_in(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    body: String,
) -> Result<Json<CheckInResponse>, ApiError> {
    let outcome = state
        .hub
        .check_in(EventId::from_uuid(event_id), body.as_bytes())
        .await?;

    Ok(Json(CheckInResponse {
        reg_no: outcome.record.profile.reg_no,
        name: outcome.record.profile.name,
        status: outcome.record.status,
        checked_in_at: outcome.record.checked_in_at,
        newly_checked_in: outcome.newly_checked_in,
    }))
}
