//! HTTP binding for the session protocol
//!
//! Owns the wire vocabulary: sentinel locators, the in-band fault value,
//! and the upgrade messages. Everything else is delegation.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::service::ProductionService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProductionService>,
}

impl AppState {
    pub fn new(service: ProductionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
