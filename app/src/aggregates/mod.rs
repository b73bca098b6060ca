//! Aggregates for the CampusHub backend.
//!
//! Each aggregate is a pure reducer over its own event stream: moderation
//! governs the event catalogue, the ledger governs per-event registration
//! books. Side effects (notifications) come back as effects for the service
//! layer to run after the append succeeds.

pub mod ledger;
pub mod moderation;

pub use ledger::{LedgerAction, LedgerEnvironment, LedgerReducer};
pub use moderation::{ModerationAction, ModerationEnvironment, ModerationReducer};
