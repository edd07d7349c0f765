//! API request and response types

use serde::{Deserialize, Serialize};

/// Request to open a session
#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub username: String,
    pub password: String,
}

/// Request carrying only a session ticket
#[derive(Debug, Deserialize)]
pub struct TicketRequest {
    pub ticket: String,
}

/// Delivery of a response document, or of a client-side failure
///
/// A non-empty `hresult` means the poller could not produce a document;
/// `message` then describes the failure and `response` is empty.
#[derive(Debug, Deserialize)]
pub struct ReceiveResponseRequest {
    pub ticket: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub hresult: String,
    #[serde(default)]
    pub message: String,
}

/// Report of a connection-level failure on the poller's side
#[derive(Debug, Deserialize)]
pub struct ConnectionErrorRequest {
    pub ticket: String,
    #[serde(default)]
    pub hresult: String,
    #[serde(default)]
    pub message: String,
}

/// The poller announcing its own version
#[derive(Debug, Deserialize)]
pub struct ClientVersionRequest {
    pub version: String,
}

/// Response to authentication
///
/// `ticket` is absent when no session opened; `company_file` then carries
/// the sentinel explaining why (`"NONE"` no work, `"nvu"` bad credentials).
#[derive(Debug, Serialize)]
pub struct AuthenticateResponse {
    pub ticket: Option<String>,
    pub company_file: String,
}

/// Next command document; empty when there is nothing left to send
#[derive(Debug, Serialize)]
pub struct SendRequestResponse {
    pub request: String,
}

/// Integer progress; negative signals a fault
#[derive(Debug, Serialize)]
pub struct ReceiveResponseResponse {
    pub progress: i32,
}

/// Always `"DONE"`: a connection error ends the session, never retries
#[derive(Debug, Serialize)]
pub struct ConnectionErrorResponse {
    pub action: String,
}

/// Last recorded failure, empty when none
#[derive(Debug, Serialize)]
pub struct LastErrorResponse {
    pub message: String,
}

/// Always `"OK"`
#[derive(Debug, Serialize)]
pub struct CloseConnectionResponse {
    pub status: String,
}

/// This server's version
#[derive(Debug, Serialize)]
pub struct ServerVersionResponse {
    pub version: String,
}

/// Verdict on the poller's version: empty, `W:` warning, or `E:` refusal
#[derive(Debug, Serialize)]
pub struct ClientVersionResponse {
    pub verdict: String,
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
