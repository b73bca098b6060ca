//! Concurrency tests for the registration ledger.
//!
//! The version-checked append is what keeps admission atomic: of several
//! writers racing for the last slot, exactly one lands its event, the rest
//! reload fresh state and get a clean capacity refusal.

#![allow(clippy::unwrap_used)]

use campushub::app::CampusHub;
use campushub::error::{LedgerError, ServiceError};
use campushub::types::{
    AttendeeId, AttendeeProfile, Capacity, EventId, Organizer, OrganizerId, OrganizerType,
};
use campushub_core::environment::Clock;
use campushub_testing::{InMemoryEventBus, InMemoryEventStore, mocks::test_clock};
use campushub::notifier::RecordingNotifier;
use chrono::Duration;
use std::sync::Arc;

fn hub() -> Arc<CampusHub> {
    Arc::new(CampusHub::new(
        Arc::new(InMemoryEventStore::new()),
        Arc::new(InMemoryEventBus::new()),
        Arc::new(test_clock()),
        Arc::new(RecordingNotifier::new()),
    ))
}

/// Admin-created event: approved and open for registration immediately
async fn open_event(hub: &CampusHub, capacity: Option<Capacity>) -> EventId {
    let start = test_clock().now() + Duration::days(7);
    let event = hub
        .create_event(campushub::app::NewEvent {
            title: "Career Fair".to_string(),
            description: String::new(),
            location: "Sports Hall".to_string(),
            starts_at: start,
            ends_at: start + Duration::hours(6),
            organizer: Organizer::new(
                OrganizerId::new(),
                OrganizerType::Admin,
                "Placement Cell".to_string(),
            ),
            capacity,
            tags: vec![],
        })
        .await
        .unwrap()
        .event;
    event.id
}

fn profile(reg_no: &str) -> AttendeeProfile {
    AttendeeProfile {
        reg_no: reg_no.to_string(),
        name: "Asha Rao".to_string(),
        branch: "CSE".to_string(),
        department: "Engineering".to_string(),
        phone: "9000000000".to_string(),
    }
}

#[tokio::test]
async fn last_slot_race_admits_exactly_one() {
    let hub = hub();
    let event_id = open_event(&hub, Capacity::new(1)).await;

    let contenders = 4;
    let mut tasks = Vec::new();
    for i in 0..contenders {
        let hub = Arc::clone(&hub);
        tasks.push(tokio::spawn(async move {
            hub.register(event_id, AttendeeId::new(), profile(&format!("21CS00{i}")))
                .await
        }));
    }

    let mut admitted = 0;
    let mut refused = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(ServiceError::Ledger(LedgerError::CapacityExceeded(_))) => refused += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(refused, contenders - 1);

    let roster = hub.roster(event_id).await.unwrap();
    assert_eq!(roster.len(), 1);
}

#[tokio::test]
async fn parallel_scans_of_one_token_check_in_once() {
    let hub = hub();
    let event_id = open_event(&hub, None).await;
    let attendee = AttendeeId::new();
    hub.register(event_id, attendee, profile("21CS042")).await.unwrap();

    let token = hub.registration_token(event_id, attendee).await.unwrap();
    let payload = token.to_json().unwrap();

    let mut tasks = Vec::new();
    for _ in 0..3 {
        let hub = Arc::clone(&hub);
        let payload = payload.clone();
        tasks.push(tokio::spawn(async move {
            hub.check_in(event_id, payload.as_bytes()).await
        }));
    }

    let mut fresh = 0;
    let mut repeats = 0;
    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        if outcome.newly_checked_in {
            fresh += 1;
        } else {
            repeats += 1;
        }
    }

    assert_eq!(fresh, 1);
    assert_eq!(repeats, 2);

    // A single check-in event on the book's stream, no matter how many scans
    let roster = hub.roster(event_id).await.unwrap();
    assert_eq!(roster.attended_only().len(), 1);
}

#[tokio::test]
async fn races_on_different_events_never_collide() {
    let hub = hub();
    let first = open_event(&hub, Capacity::new(1)).await;
    let second = open_event(&hub, Capacity::new(1)).await;

    let mut tasks = Vec::new();
    for event_id in [first, second] {
        let hub = Arc::clone(&hub);
        tasks.push(tokio::spawn(async move {
            hub.register(event_id, AttendeeId::new(), profile("21CS001"))
                .await
        }));
    }

    // Separate streams per book: both single-slot events fill independently
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(hub.roster(first).await.unwrap().len(), 1);
    assert_eq!(hub.roster(second).await.unwrap().len(), 1);
}
