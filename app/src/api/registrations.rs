//! Registration and roster endpoints.
//!
//! - POST /api/events/:id/registrations - Register an attendee
//! - GET /api/events/:id/registrations/:attendee_id - Registration details
//! - DELETE /api/events/:id/registrations/:attendee_id - Cancel (frees the slot)
//! - GET /api/events/:id/registrations/:attendee_id/token - Verification token
//! - GET /api/events/:id/registrations/:attendee_id/qr - Token as SVG QR code
//! - GET /api/events/:id/roster - Attendance roster
//! - GET /api/events/:id/roster.csv - Roster as CSV download

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::attendance::VerificationToken;
use crate::types::{AttendeeId, AttendeeProfile, EventId, RegistrationRecord, RegistrationStatus};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to register an attendee
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Attendee account id
    pub attendee_id: Uuid,
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

/// Registration details response
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    /// Record id
    pub registration_id: Uuid,
    /// Event registered for
    pub event_id: Uuid,
    /// Registered attendee
    pub attendee_id: Uuid,
    /// University registration number
    pub reg_no: String,
    /// Registered or Attended
    pub status: RegistrationStatus,
    /// When the attendee registered
    pub registered_at: DateTime<Utc>,
    /// When the attendee checked in, if they did
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl From<RegistrationRecord> for RegistrationResponse {
    fn from(record: RegistrationRecord) -> Self {
        Self {
            registration_id: *record.id.as_uuid(),
            event_id: *record.event_id.as_uuid(),
            attendee_id: *record.attendee_id.as_uuid(),
            reg_no: record.profile.reg_no,
            status: record.status,
            registered_at: record.registered_at,
            checked_in_at: record.checked_in_at,
        }
    }
}

/// Query parameters for the roster
#[derive(Debug, Deserialize)]
pub struct RosterQuery {
    /// Only rows that checked in
    #[serde(default)]
    pub attended_only: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register an attendee for an approved event.
///
/// Admission enforces capacity and one-active-registration-per-attendee
/// atomically; a last-slot race admits exactly one of the contenders.
pub async fn register(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), ApiError> {
    let record = state
        .hub
        .register(
            EventId::from_uuid(event_id),
            AttendeeId::from_uuid(request.attendee_id),
            AttendeeProfile {
                reg_no: request.reg_no,
                name: request.name,
                branch: request.branch,
                department: request.department,
                phone: request.phone,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Registration details for one attendee.
pub async fn get_registration(
    Path((event_id, attendee_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
) -> Result<Json<RegistrationResponse>, ApiError> {
    let record = state
        .hub
        .registration(
            EventId::from_uuid(event_id),
            AttendeeId::from_uuid(attendee_id),
        )
        .await?;
    Ok(Json(record.into()))
}

/// Cancel a registration. Hard delete: the slot frees immediately and the
/// attendee may register again later.
pub async fn cancel_registration(
    Path((event_id, attendee_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state
        .hub
        .cancel_registration(
            EventId::from_uuid(event_id),
            AttendeeId::from_uuid(attendee_id),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The verification token for an active registration, as JSON.
pub async fn get_token(
    Path((event_id, attendee_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
) -> Result<Json<VerificationToken>, ApiError> {
    let token = state
        .hub
        .registration_token(
            EventId::from_uuid(event_id),
            AttendeeId::from_uuid(attendee_id),
        )
        .await?;
    Ok(Json(token))
}

/// The verification token rendered as an SVG QR code.
pub async fn get_token_qr(
    Path((event_id, attendee_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let svg = state
        .hub
        .registration_qr_svg(
            EventId::from_uuid(event_id),
            AttendeeId::from_uuid(attendee_id),
        )
        .await?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

/// The attendance roster, ordered by registration time.
pub async fn get_roster(
    Path(event_id): Path<Uuid>,
    Query(query): Query<RosterQuery>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let roster = state.hub.roster(EventId::from_uuid(event_id)).await?;
    let rows = if query.attended_only {
        roster.attended_only()
    } else {
        roster.rows()
    };
    Ok(Json(serde_json::json!({
        "total": rows.len(),
        "rows": rows,
    })))
}

/// The attendance roster as a CSV download.
pub async fn get_roster_csv(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = state.hub.roster_csv(EventId::from_uuid(event_id)).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"roster.csv\"",
            ),
        ],
        csv,
    ))
}
