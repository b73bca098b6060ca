//! Organizer notification collaborator.
//!
//! Moderation decisions (approve, reject) owe the organizer a status email.
//! The mail relay is an external system, so it sits behind a trait: the
//! production default logs the notification, tests record it.

use crate::error::NotifyError;
use crate::types::Organizer;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Sends status notifications to organizers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notify an organizer that their event was approved or rejected.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if delivery fails. Callers log and move on:
    /// a lost email never fails the moderation decision itself.
    async fn event_status_email(
        &self,
        organizer: &Organizer,
        event_title: &str,
        approved: bool,
    ) -> Result<(), NotifyError>;
}

/// Default notifier: emits the notification as a structured log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn event_status_email(
        &self,
        organizer: &Organizer,
        event_title: &str,
        approved: bool,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            organizer = %organizer.name,
            organizer_id = %organizer.id,
            event_title,
            approved,
            "organizer status notification"
        );
        Ok(())
    }
}

/// A sent notification, as captured by [`RecordingNotifier`].
#[derive(Clone, Debug, PartialEq)]
pub struct SentNotification {
    /// Recipient organizer name
    pub organizer: String,
    /// Event the notification is about
    pub event_title: String,
    /// Approved (`true`) or rejected (`false`)
    pub approved: bool,
}

/// Test notifier that records every notification it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentNotification>>>,
}

impl RecordingNotifier {
    /// Creates an empty recording notifier
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications sent so far, in order
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (test infrastructure).
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    #[allow(clippy::unwrap_used)]
    async fn event_status_email(
        &self,
        organizer: &Organizer,
        event_title: &str,
        approved: bool,
    ) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(SentNotification {
            organizer: organizer.name.clone(),
            event_title: event_title.to_string(),
            approved,
        });
        Ok(())
    }
}
