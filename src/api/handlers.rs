//! HTTP request handlers
//!
//! One route per poller call. Handlers translate between the fixed wire
//! vocabulary and the facade's types; every failure that reaches the
//! poller is encoded in that vocabulary, never as a bare transport error.

use super::types::{
    AuthenticateRequest, AuthenticateResponse, ClientVersionRequest, ClientVersionResponse,
    CloseConnectionResponse, ConnectionErrorRequest, ConnectionErrorResponse, ErrorResponse,
    LastErrorResponse, ReceiveResponseRequest, ReceiveResponseResponse, SendRequestResponse,
    ServerVersionResponse, TicketRequest,
};
use super::AppState;
use crate::auth::{self, VersionVerdict};
use crate::service::{AuthOutcome, ServiceError};
use crate::session::SessionId;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Locator sentinel for "credentials fine, nothing to do."
const LOCATOR_NO_WORK: &str = "NONE";

/// Locator sentinel for rejected credentials.
const LOCATOR_INVALID_USER: &str = "nvu";

/// Progress value signalling an in-band client-reported fault.
const CLIENT_FAULT_PROGRESS: i32 = -101;

/// Wire replies for the client version gate.
const UPGRADE_REQUIRED: &str = "E:You need to upgrade your QBWebConnector";
const UPGRADE_RECOMMENDED: &str = "W:It is recommended that you upgrade your QBWebConnector";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session establishment
        .route("/api/authenticate", post(authenticate))
        // Command and response round trips
        .route("/api/send-request", post(send_request))
        .route("/api/receive-response", post(receive_response))
        // Failure reporting
        .route("/api/connection-error", post(connection_error))
        .route("/api/last-error", post(last_error))
        // Session teardown
        .route("/api/close-connection", post(close_connection))
        // Version negotiation
        .route("/api/server-version", get(server_version))
        .route("/api/client-version", post(client_version))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Establishment
// ============================================================

async fn authenticate(
    State(state): State<AppState>,
    Json(req): Json<AuthenticateRequest>,
) -> Json<AuthenticateResponse> {
    let outcome = state.service.authenticate(&req.username, &req.password).await;
    Json(auth_reply(outcome))
}

fn auth_reply(outcome: AuthOutcome) -> AuthenticateResponse {
    match outcome {
        AuthOutcome::Granted {
            session,
            company_file,
        } => AuthenticateResponse {
            ticket: Some(session.to_string()),
            company_file,
        },
        AuthOutcome::NoWork => AuthenticateResponse {
            ticket: None,
            company_file: LOCATOR_NO_WORK.to_string(),
        },
        AuthOutcome::Denied => AuthenticateResponse {
            ticket: None,
            company_file: LOCATOR_INVALID_USER.to_string(),
        },
    }
}

// ============================================================
// Command and Response Round Trips
// ============================================================

async fn send_request(
    State(state): State<AppState>,
    Json(req): Json<TicketRequest>,
) -> Result<Json<SendRequestResponse>, AppError> {
    let ticket = SessionId::new(req.ticket.trim());
    let request = state.service.generate_request(&ticket).await?;
    Ok(Json(SendRequestResponse { request }))
}

async fn receive_response(
    State(state): State<AppState>,
    Json(req): Json<ReceiveResponseRequest>,
) -> Result<Json<ReceiveResponseResponse>, AppError> {
    let ticket = SessionId::new(req.ticket.trim());

    // The poller failed on its side and sent an error pair instead of a
    // document. Record it for the follow-up last-error call and answer
    // with the in-band fault value; the session stays open.
    if !req.hresult.trim().is_empty() {
        tracing::warn!(session = %ticket, hresult = %req.hresult, "Poller reported a client-side failure");
        state.service.record_error(&ticket, &req.message).await;
        return Ok(Json(ReceiveResponseResponse {
            progress: CLIENT_FAULT_PROGRESS,
        }));
    }

    let progress = state.service.process_response(&ticket, &req.response).await?;
    Ok(Json(ReceiveResponseResponse {
        progress: i32::from(progress),
    }))
}

// ============================================================
// Failure Reporting
// ============================================================

async fn connection_error(
    State(state): State<AppState>,
    Json(req): Json<ConnectionErrorRequest>,
) -> Json<ConnectionErrorResponse> {
    let ticket = SessionId::new(req.ticket.trim());
    state
        .service
        .connection_fault(&ticket, &req.message, &req.hresult)
        .await;
    Json(ConnectionErrorResponse {
        action: "DONE".to_string(),
    })
}

async fn last_error(
    State(state): State<AppState>,
    Json(req): Json<TicketRequest>,
) -> Result<Json<LastErrorResponse>, AppError> {
    let ticket = SessionId::new(req.ticket.trim());
    let message = state.service.read_error(&ticket).await?.unwrap_or_default();
    Ok(Json(LastErrorResponse { message }))
}

// ============================================================
// Session Teardown
// ============================================================

async fn close_connection(
    State(state): State<AppState>,
    Json(req): Json<TicketRequest>,
) -> Json<CloseConnectionResponse> {
    let ticket = SessionId::new(req.ticket.trim());
    state.service.close(&ticket).await;
    Json(CloseConnectionResponse {
        status: "OK".to_string(),
    })
}

// ============================================================
// Version Negotiation
// ============================================================

async fn server_version() -> Json<ServerVersionResponse> {
    Json(ServerVersionResponse {
        version: auth::server_version().to_string(),
    })
}

async fn client_version(Json(req): Json<ClientVersionRequest>) -> Json<ClientVersionResponse> {
    Json(ClientVersionResponse {
        verdict: verdict_reply(auth::client_version_verdict(&req.version)),
    })
}

fn verdict_reply(verdict: VersionVerdict) -> String {
    match verdict {
        VersionVerdict::Proceed => String::new(),
        VersionVerdict::Outdated => UPGRADE_RECOMMENDED.to_string(),
        VersionVerdict::Unsupported => UPGRADE_REQUIRED.to_string(),
    }
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("ledgerlink ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::UnknownSession(_) => AppError::NotFound(message),
            ServiceError::MalformedResponse(_) => AppError::BadRequest(message),
            ServiceError::CommandBuild(_) => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
