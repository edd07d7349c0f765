//! Concurrent session registry

use super::{Session, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// The referenced ticket is not live.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown session {0}")]
pub struct UnknownSession(pub SessionId);

/// Registry of active sessions.
///
/// The outer lock only guards the map; each session's mutable state sits
/// behind its own mutex, so calls against one ticket serialize while
/// different tickets proceed concurrently.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new idle session and return its ticket
    pub async fn create(&self) -> SessionId {
        let id = SessionId::generate();
        let session = Arc::new(Mutex::new(Session::new()));
        self.sessions.write().await.insert(id.clone(), session);
        id
    }

    #[allow(dead_code)] // The facade validates tickets via lookup()
    pub async fn exists(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Handle for exclusive access to one session's state
    pub async fn lookup(&self, id: &SessionId) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Record a failure message against a session.
    ///
    /// Silently ignores unknown tickets: error recording is often used to
    /// report a different prior failure and must never fail itself.
    pub async fn record_error(&self, id: &SessionId, message: &str) {
        if let Some(handle) = self.lookup(id).await {
            handle.lock().await.last_error = Some(message.to_string());
        }
    }

    /// Read the recorded failure, if any
    pub async fn read_error(&self, id: &SessionId) -> Result<Option<String>, UnknownSession> {
        match self.lookup(id).await {
            Some(handle) => Ok(handle.lock().await.last_error.clone()),
            None => Err(UnknownSession(id.clone())),
        }
    }

    /// Remove a session. Idempotent; returns whether the ticket was live.
    pub async fn delete(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }
}
