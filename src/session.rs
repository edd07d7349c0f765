//! Session (ticket) types and registry
//!
//! Sessions live in process memory only. A restart loses them all, which
//! is acceptable because the poller re-authenticates and starts fresh.

mod store;

pub use store::{SessionStore, UnknownSession};

use crate::state_machine::QueryState;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque session ticket.
///
/// The sole correlation key for every call in a session. Generated
/// time-ordered, so ids are unguessable and never reused within a
/// process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a ticket received from the wire
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub(crate) fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    #[allow(dead_code)] // Tests read the raw ticket; handlers format via Display
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One poller work session. Keyed by its ticket in the store.
#[derive(Debug)]
pub struct Session {
    pub query: QueryState,
    /// Most recent failure recorded against the session. Cleared only by
    /// deletion, never by reading.
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            query: QueryState::Idle,
            last_error: None,
            created_at: Utc::now(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
