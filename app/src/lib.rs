//! # CampusHub
//!
//! Event-sourced backend for campus event management: moderated event
//! listings, capacity-bounded registration, QR attendance verification, and
//! attendance reporting.
//!
//! ## Architecture
//!
//! Two aggregates carry all writes:
//!
//! - **Moderation** owns the event catalogue and its lifecycle
//!   (pending → approved / rejected / cancelled, with `Completed` derived
//!   at read time).
//! - **Ledger** owns one registration book per approved event, enforcing
//!   capacity and per-attendee uniqueness atomically via optimistic
//!   concurrency on the book's stream.
//!
//! The [`app::CampusHub`] coordinator stitches the two together and is the
//! only surface the HTTP layer in [`api`] talks to.

pub mod aggregates;
pub mod api;
pub mod app;
pub mod attendance;
pub mod config;
pub mod error;
pub mod notifier;
pub mod projections;
pub mod types;
