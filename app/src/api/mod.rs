//! HTTP API for the CampusHub backend.
//!
//! Handlers are organized by domain:
//! - Events: catalogue CRUD and moderation decisions
//! - Registrations: admission, cancellation, tokens, rosters
//! - Check-in: token verification at the venue

pub mod checkin;
pub mod error;
pub mod events;
pub mod registrations;

use crate::app::CampusHub;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// The application façade
    pub hub: Arc<CampusHub>,
}

/// Builds the API router
#[must_use]
pub fn router(hub: Arc<CampusHub>) -> Router {
    Router::new()
        .route(
            "/api/events",
            post(events::create_event).get(events::list_events),
        )
        .route(
            "/api/events/:id",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route("/api/events/:id/approve", post(events::approve_event))
        .route("/api/events/:id/reject", post(events::reject_event))
        .route("/api/events/:id/cancel", post(events::cancel_event))
        .route(
            "/api/events/:id/registrations",
            post(registrations::register),
        )
        .route(
            "/api/events/:id/registrations/:attendee_id",
            get(registrations::get_registration).delete(registrations::cancel_registration),
        )
        .route(
            "/api/events/:id/registrations/:attendee_id/token",
            get(registrations::get_token),
        )
        .route(
            "/api/events/:id/registrations/:attendee_id/qr",
            get(registrations::get_token_qr),
        )
        .route("/api/events/:id/check-in", post(checkin::check_in))
        .route("/api/events/:id/roster", get(registrations::get_roster))
        .route(
            "/api/events/:id/roster.csv",
            get(registrations::get_roster_csv),
        )
        .with_state(AppState { hub })
}
