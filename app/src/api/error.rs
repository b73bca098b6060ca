//! HTTP error envelope.
//!
//! Every failed request returns `{ "error": <message>, "code": <code> }`
//! with a status drawn from the domain error: 404 for things that don't
//! exist, 409 for state that got in the way, 400 for bad input, 403 for
//! authorization, 500 for infrastructure. Infrastructure details are logged
//! but never sent to the client.

use crate::error::{CheckInError, LedgerError, ModerationError, ServiceError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
    /// Stable machine-readable code
    pub code: &'static str,
}

/// An API-level error: status plus envelope
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// Builds an error response
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                code,
            },
        }
    }

    /// 400 with a caller-visible message
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match &error {
            ServiceError::Moderation(moderation) => {
                let (status, code) = match moderation {
                    ModerationError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                    ModerationError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
                    ModerationError::InvalidTransition { .. } => {
                        (StatusCode::CONFLICT, "invalid_transition")
                    },
                    ModerationError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
                    ModerationError::InvalidSchedule(_) => {
                        (StatusCode::BAD_REQUEST, "invalid_schedule")
                    },
                    ModerationError::NothingToUpdate => {
                        (StatusCode::BAD_REQUEST, "nothing_to_update")
                    },
                };
                Self::new(status, code, moderation.to_string())
            },
            ServiceError::Ledger(ledger) => {
                let (status, code) = match ledger {
                    LedgerError::EventNotFound(_) => (StatusCode::NOT_FOUND, "event_not_found"),
                    LedgerError::RegistrationNotFound(_) | LedgerError::UnknownRegistration(_) => {
                        (StatusCode::NOT_FOUND, "registration_not_found")
                    },
                    LedgerError::Ineligible(_) => (StatusCode::CONFLICT, "ineligible"),
                    LedgerError::CapacityExceeded(_) => {
                        (StatusCode::CONFLICT, "capacity_exceeded")
                    },
                    LedgerError::DuplicateRegistration(_) => {
                        (StatusCode::CONFLICT, "duplicate_registration")
                    },
                };
                Self::new(status, code, ledger.to_string())
            },
            ServiceError::CheckIn(check_in) => {
                let (status, code) = match check_in {
                    CheckInError::MalformedToken(_) => {
                        (StatusCode::BAD_REQUEST, "malformed_token")
                    },
                    CheckInError::EventMismatch { .. } => (StatusCode::CONFLICT, "event_mismatch"),
                };
                Self::new(status, code, check_in.to_string())
            },
            ServiceError::EventStore(_) | ServiceError::EventBus(_) => {
                tracing::error!(%error, "infrastructure failure");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal error",
                )
            },
            ServiceError::Serialization(_) => {
                tracing::error!(%error, "serialization failure");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal error",
                )
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
