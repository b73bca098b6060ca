//! Event catalogue and moderation endpoints.
//!
//! - POST /api/events - Submit a new event (pending unless admin)
//! - GET /api/events - List the catalogue
//! - GET /api/events/:id - Event details
//! - PATCH /api/events/:id - Update details (organizer or admin)
//! - DELETE /api/events/:id - Remove an event (organizer or admin)
//! - POST /api/events/:id/approve - Approve a pending event (admin)
//! - POST /api/events/:id/reject - Reject a pending event (admin)
//! - POST /api/events/:id/cancel - Call off an approved event

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::app::{EventChanges, EventView, NewEvent};
use crate::types::{Actor, Capacity, EventId, EventStatus, Organizer, OrganizerId, OrganizerType};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to submit a new event
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Event title
    pub title: String,
    /// Event description
    pub description: String,
    /// Venue description
    pub location: String,
    /// Start time
    pub starts_at: DateTime<Utc>,
    /// End time
    pub ends_at: DateTime<Utc>,
    /// Organizer account id
    pub organizer_id: Uuid,
    /// Organizer kind (`Club`, `Faculty`, `Admin`)
    pub organizer_type: OrganizerType,
    /// Organizer display name
    pub organizer_name: String,
    /// Attendance cap; omit for unlimited
    pub capacity: Option<u32>,
    /// Discovery tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The acting account, for authorization checks
#[derive(Debug, Deserialize)]
pub struct ActorPayload {
    /// Acting account id
    pub actor_id: Uuid,
    /// Acting account role
    pub actor_role: OrganizerType,
}

impl ActorPayload {
    fn into_actor(self) -> Actor {
        Actor::new(OrganizerId::from_uuid(self.actor_id), self.actor_role)
    }
}

/// Request to update an event
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    /// Acting account id
    pub actor_id: Uuid,
    /// Acting account role
    pub actor_role: OrganizerType,
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New location
    pub location: Option<String>,
    /// New capacity
    pub capacity: Option<u32>,
    /// New tags
    pub tags: Option<Vec<String>>,
}

/// Event details response
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Event id
    pub id: Uuid,
    /// Event title
    pub title: String,
    /// Event description
    pub description: String,
    /// Venue description
    pub location: String,
    /// Start time
    pub starts_at: DateTime<Utc>,
    /// End time
    pub ends_at: DateTime<Utc>,
    /// Organizer display name
    pub organizer: String,
    /// Attendance cap; `null` for unlimited
    pub capacity: Option<u32>,
    /// Status as readers see it (`Completed` is derived)
    pub status: EventStatus,
    /// Live count of active registrations, derived from the ledger
    pub registered_count: usize,
    /// Discovery tags
    pub tags: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<EventView> for EventResponse {
    fn from(view: EventView) -> Self {
        let event = view.event;
        Self {
            id: *event.id.as_uuid(),
            title: event.title,
            description: event.description,
            location: event.location,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            organizer: event.organizer.name,
            capacity: event.capacity.map(|c| c.value()),
            status: event.status,
            registered_count: view.registered_count,
            tags: event.tags,
            created_at: event.created_at,
        }
    }
}

/// Query parameters for listing events
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    /// Filter by status
    pub status: Option<EventStatus>,
}

/// Response for listing events
#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    /// Matching events, ordered by start time
    pub events: Vec<EventResponse>,
    /// Count of matching events
    pub total: usize,
}

/// Parses an optional capacity number, refusing zero
fn parse_capacity(capacity: Option<u32>) -> Result<Option<Capacity>, ApiError> {
    match capacity {
        None => Ok(None),
        Some(value) => Capacity::new(value)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request("capacity must be positive")),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a new event.
///
/// Club and faculty events start pending review; admin events go live
/// immediately.
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let capacity = parse_capacity(request.capacity)?;
    let event = state
        .hub
        .create_event(NewEvent {
            title: request.title,
            description: request.description,
            location: request.location,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            organizer: Organizer::new(
                OrganizerId::from_uuid(request.organizer_id),
                request.organizer_type,
                request.organizer_name,
            ),
            capacity,
            tags: request.tags,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(event.into())))
}

/// List the event catalogue, newest start time last.
pub async fn list_events(
    Query(query): Query<ListEventsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let mut events = state.hub.list_events().await?;
    if let Some(status) = query.status {
        events.retain(|view| view.event.status == status);
    }

    let events: Vec<EventResponse> = events.into_iter().map(Into::into).collect();
    let total = events.len();
    Ok(Json(ListEventsResponse { events, total }))
}

/// Event details by id.
pub async fn get_event(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state.hub.get_event(EventId::from_uuid(event_id)).await?;
    Ok(Json(event.into()))
}

/// Update an approved event's details before it starts.
pub async fn update_event(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    let capacity = parse_capacity(request.capacity)?;
    let actor = Actor::new(OrganizerId::from_uuid(request.actor_id), request.actor_role);
    let event = state
        .hub
        .update_event(EventId::from_uuid(event_id), actor, EventChanges {
            title: request.title,
            description: request.description,
            location: request.location,
            capacity,
            tags: request.tags,
        })
        .await?;
    Ok(Json(event.into()))
}

/// Remove an event outright.
pub async fn delete_event(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<ActorPayload>,
) -> Result<StatusCode, ApiError> {
    state
        .hub
        .delete_event(EventId::from_uuid(event_id), request.into_actor())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Approve a pending event. Opens its registration book.
pub async fn approve_event(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state.hub.approve_event(EventId::from_uuid(event_id)).await?;
    Ok(Json(event.into()))
}

/// Reject a pending event. Destructive: the event is removed entirely.
pub async fn reject_event(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.hub.reject_event(EventId::from_uuid(event_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Call off an approved event. Existing registrations are kept for the
/// record; the book stops accepting new ones.
pub async fn cancel_event(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<ActorPayload>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state
        .hub
        .cancel_event(EventId::from_uuid(event_id), request.into_actor())
        .await?;
    Ok(Json(event.into()))
}
