//! Event stream identification and versioning types.
//!
//! Every aggregate instance owns exactly one event stream. The stream id
//! encodes the aggregate kind plus the instance id (`events` for the
//! moderated catalogue, `ledger-{uuid}` for one event's registration book),
//! and the version drives optimistic concurrency control on append.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for `StreamId` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid stream ID: {0}")]
pub struct ParseStreamIdError(String);

/// Unique identifier for an event stream (aggregate instance).
///
/// For example:
/// - `"events"` — the moderation stream of the event catalogue
/// - `"ledger-3f9c..."` — the registration ledger of one event
///
/// # Validation
///
/// - `FromStr::from_str()`: validates input (rejects empty strings)
/// - `From::from()` and `new()`: no validation, for application-controlled
///   input (stream ids built from typed UUIDs)
///
/// # Examples
///
/// ```
/// use campushub_core::stream::StreamId;
///
/// let stream_id = StreamId::new("event-42");
/// assert_eq!(stream_id.as_str(), "event-42");
///
/// let parsed: StreamId = "ledger-42".parse().unwrap();
/// assert_eq!(parsed, StreamId::new("ledger-42"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(String);

impl StreamId {
    /// Create a new `StreamId` from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the stream ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the `StreamId` into its inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StreamId {
    type Err = ParseStreamIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseStreamIdError("Stream ID cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for StreamId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StreamId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Event version number for optimistic concurrency control.
///
/// Versions start at 0 and increment by 1 for each event appended to a
/// stream. On append the caller states the version it believes the stream is
/// at; a mismatch means a concurrent writer got there first, the append is
/// refused, and the caller reloads and re-decides against fresh state. This
/// is what makes "capacity check + append" atomic without a lock.
///
/// # Examples
///
/// ```
/// use campushub_core::stream::Version;
///
/// let v0 = Version::INITIAL;
/// let v1 = v0.next();
/// assert_eq!(v1, Version::new(1));
/// assert_eq!(v1.value(), 1);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u64);

impl Version {
    /// The initial version (0) for a new event stream.
    pub const INITIAL: Self = Self(0);

    /// Create a new `Version` with the given value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the version number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Get the next version (current + 1).
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Check if this is the initial version (0).
    #[must_use]
    pub const fn is_initial(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Version> for u64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl std::ops::Add<u64> for Version {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_stream_id() {
        let id = StreamId::new("event-123");
        assert_eq!(id.as_str(), "event-123");
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if parse fails
    fn parse_from_str() {
        let id: StreamId = "ledger-123".parse().expect("parse should succeed");
        assert_eq!(id, StreamId::new("ledger-123"));
    }

    #[test]
    fn parse_empty_string_fails() {
        let result = "".parse::<StreamId>();
        assert!(result.is_err());
    }

    #[test]
    fn stream_id_display_and_into_inner() {
        let id = StreamId::new("event-123");
        assert_eq!(format!("{id}"), "event-123");
        assert_eq!(id.into_inner(), "event-123");
    }

    #[test]
    fn initial_version() {
        assert_eq!(Version::INITIAL, Version::new(0));
        assert!(Version::INITIAL.is_initial());
        assert!(!Version::new(1).is_initial());
    }

    #[test]
    fn next_version_increments() {
        let v0 = Version::new(0);
        assert_eq!(v0.next(), Version::new(1));
        assert_eq!(v0.next().next(), Version::new(2));
    }

    #[test]
    fn version_ordering_and_arithmetic() {
        assert!(Version::new(1) < Version::new(2));
        assert_eq!(Version::new(5) + 3, Version::new(8));

        let num: u64 = Version::from(42_u64).into();
        assert_eq!(num, 42);
    }
}
