//! `LedgerLink` - session server for a polling accounting connector
//!
//! A Rust backend implementing the ticketed request/response protocol a
//! desktop accounting connector polls against.

mod api;
mod auth;
mod codec;
mod config;
mod service;
mod session;
mod state_machine;

use api::{create_router, AppState};
use auth::StaticCredentials;
use codec::QbxmlCodec;
use config::Config;
use service::SessionService;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerlink=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env();
    if config.default_credentials() {
        tracing::warn!(
            "Default credentials in use. Set LEDGERLINK_USERNAME and LEDGERLINK_PASSWORD."
        );
    }
    tracing::info!(
        entity = %config.query_entity,
        page_size = config.page_size,
        company_file = %config.company_file,
        "Query target configured"
    );

    // Create application state
    let policy = StaticCredentials::new(config.username, config.password, config.company_file);
    let service = SessionService::new(
        QbxmlCodec::new(),
        policy,
        config.query_entity,
        config.page_size,
    );
    let state = AppState::new(service);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("LedgerLink server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
