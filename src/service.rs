//! Session protocol facade
//!
//! One method per poller call. Each validates the session ticket,
//! delegates to the pure state machine, and renders or parses query
//! documents through the codec. No protocol decisions live here beyond
//! "the ticket must exist."


use crate::auth::{AuthDecision, CredentialPolicy, StaticCredentials};
use crate::codec::{CodecError, CommandCodec, CommandPlan, QbxmlCodec};
use crate::session::{SessionId, SessionStore, UnknownSession};
use crate::state_machine::{transition, Event, Reply, Transition};
use chrono::Utc;
use thiserror::Error;

/// Type alias for the production facade with concrete implementations
pub type ProductionService = SessionService<QbxmlCodec, StaticCredentials>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    UnknownSession(#[from] UnknownSession),

    #[error("response document rejected: {0}")]
    MalformedResponse(CodecError),

    #[error("could not render command document: {0}")]
    CommandBuild(CodecError),
}

/// Result of an authentication round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials accepted; a session is live under this ticket.
    Granted {
        session: SessionId,
        company_file: String,
    },
    /// Credentials accepted but there is nothing to do; no session opened.
    NoWork,
    /// Credentials rejected.
    Denied,
}

/// Coordinates the session registry, the conversation state machine,
/// and the document codec.
pub struct SessionService<C: CommandCodec, P: CredentialPolicy> {
    store: SessionStore,
    codec: C,
    policy: P,
    entity: String,
    page_size: u32,
}

impl<C: CommandCodec, P: CredentialPolicy> SessionService<C, P> {
    pub fn new(codec: C, policy: P, entity: impl Into<String>, page_size: u32) -> Self {
        Self {
            store: SessionStore::new(),
            codec,
            policy,
            entity: entity.into(),
            page_size,
        }
    }

    /// Evaluate a credential pair and, on acceptance, open a session.
    ///
    /// Both arguments are trimmed of surrounding whitespace before the
    /// policy sees them; pollers routinely pad these fields.
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
        let username = username.trim();
        let password = password.trim();

        match self.policy.evaluate(username, password).await {
            AuthDecision::Accept { company_file } => {
                let session = self.store.create().await;
                tracing::info!(session = %session, company_file = %company_file, "Session opened");
                AuthOutcome::Granted {
                    session,
                    company_file,
                }
            }
            AuthDecision::NoWork => {
                tracing::info!(username = %username, "Credentials accepted but no work is queued");
                AuthOutcome::NoWork
            }
            AuthDecision::Reject => {
                tracing::warn!(username = %username, "Rejected credentials");
                AuthOutcome::Denied
            }
        }
    }

    /// Produce the next outbound command document for this session.
    ///
    /// An empty string means "nothing left to send." Invalid-state calls
    /// degrade to that same empty command rather than failing, so the
    /// poller is never left retrying a call with no usable answer.
    pub async fn generate_request(&self, session: &SessionId) -> Result<String, ServiceError> {
        let handle = self
            .store
            .lookup(session)
            .await
            .ok_or_else(|| UnknownSession(session.clone()))?;
        let mut live = handle.lock().await;

        let Transition {
            next,
            reply,
            anomaly,
        } = transition(&live.query, Event::CommandRequested);
        if let Some(anomaly) = &anomaly {
            tracing::warn!(session = %session, state = live.query.name(), %anomaly, "Degraded command request");
        }

        let document = match reply {
            Reply::Command(Some(directive)) => {
                let plan = CommandPlan {
                    entity: self.entity.clone(),
                    directive,
                    page_size: self.page_size,
                };
                self.codec
                    .build_command(&plan)
                    .map_err(ServiceError::CommandBuild)?
            }
            Reply::Command(None) => String::new(),
            Reply::Progress(_) => {
                tracing::error!(session = %session, "Command request produced a progress reply");
                String::new()
            }
        };

        live.query = next;
        tracing::debug!(session = %session, state = live.query.name(), bytes = document.len(), "Command generated");
        Ok(document)
    }

    /// Consume a response document and report integer progress.
    ///
    /// The document is parsed before any session state changes, so a
    /// malformed response leaves the outstanding command outstanding and
    /// the poller free to retry.
    pub async fn process_response(
        &self,
        session: &SessionId,
        document: &str,
    ) -> Result<u8, ServiceError> {
        let handle = self
            .store
            .lookup(session)
            .await
            .ok_or_else(|| UnknownSession(session.clone()))?;

        let page = self
            .codec
            .parse_page(document)
            .map_err(ServiceError::MalformedResponse)?;

        let mut live = handle.lock().await;
        let Transition {
            next,
            reply,
            anomaly,
        } = transition(&live.query, Event::PageReceived(page));
        if let Some(anomaly) = &anomaly {
            tracing::warn!(session = %session, state = live.query.name(), %anomaly, "Degraded response handling");
        }
        live.query = next;

        let progress = match reply {
            Reply::Progress(value) => value,
            Reply::Command(_) => {
                tracing::error!(session = %session, "Response produced a command reply");
                100
            }
        };
        tracing::debug!(
            session = %session,
            state = live.query.name(),
            items = live.query.items_consumed(),
            progress,
            "Response consumed"
        );
        Ok(progress)
    }

    /// Record a failure message against the session.
    ///
    /// Unknown tickets are tolerated silently; error recording is itself
    /// sometimes used to report a different prior failure and must never
    /// add one of its own.
    pub async fn record_error(&self, session: &SessionId, message: &str) {
        tracing::warn!(session = %session, error = %message, "Connector reported an error");
        self.store.record_error(session, message).await;
    }

    /// Read back the last recorded failure, if any.
    pub async fn read_error(&self, session: &SessionId) -> Result<Option<String>, ServiceError> {
        Ok(self.store.read_error(session).await?)
    }

    /// Close the session. Idempotent; closing an unknown ticket is fine.
    pub async fn close(&self, session: &SessionId) {
        if let Some(handle) = self.store.lookup(session).await {
            let (opened_at, completed) = {
                let live = handle.lock().await;
                (live.created_at, live.query.is_terminal())
            };
            self.store.delete(session).await;
            let age = Utc::now().signed_duration_since(opened_at);
            tracing::info!(
                session = %session,
                age_secs = age.num_seconds(),
                completed,
                "Session closed"
            );
        } else {
            tracing::debug!(session = %session, "Close for unknown session");
        }
    }

    /// Handle a connection fault reported by the poller.
    ///
    /// Always terminal: the message is recorded for a trailing error read
    /// and the session is deleted. No retry is ever attempted.
    pub async fn connection_fault(&self, session: &SessionId, message: &str, code: &str) {
        tracing::warn!(session = %session, code = %code, error = %message, "Connection fault, abandoning session");
        self.store.record_error(session, message).await;
        self.store.delete(session).await;
    }
}
