//! Application layer: services and the coordinator façade.

pub mod coordinator;
pub mod services;

pub use coordinator::{CampusHub, CheckInOutcome, EventChanges, EventView, NewEvent};
pub use services::{LEDGER_TOPIC, LedgerService, MODERATION_TOPIC, ModerationService};
