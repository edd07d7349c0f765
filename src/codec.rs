//! Command document codec
//!
//! The seam between the protocol core and the document dialect the poller
//! executes. The core hands a logical command plan across this boundary
//! and gets back raw document text; inbound documents come back as decoded
//! pages. Mock implementations live in `service::testing`.

mod qbxml;

pub use qbxml::QbxmlCodec;

use crate::state_machine::{PageDirective, PageView};
use std::sync::Arc;
use thiserror::Error;

/// Logical shape of one outbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    /// Backend entity to query, e.g. `Customer`.
    pub entity: String,
    /// Open a fresh iteration or resume from a cursor.
    pub directive: PageDirective,
    /// Upper bound on items the backend may return in one page.
    pub page_size: u32,
}

/// Errors from building or decoding command documents
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("entity name {0:?} cannot form a document element")]
    InvalidEntity(String),

    #[error("malformed response document: {0}")]
    Malformed(String),

    #[error("response carries no query result element")]
    MissingResult,

    #[error("backend reported status {code}: {message}")]
    Status { code: String, message: String },
}

/// Builds outbound command documents and decodes inbound responses
pub trait CommandCodec: Send + Sync {
    /// Render the next outbound command document
    fn build_command(&self, plan: &CommandPlan) -> Result<String, CodecError>;

    /// Decode one inbound response document into a page
    fn parse_page(&self, raw: &str) -> Result<PageView, CodecError>;
}

impl<T: CommandCodec + ?Sized> CommandCodec for Arc<T> {
    fn build_command(&self, plan: &CommandPlan) -> Result<String, CodecError> {
        (**self).build_command(plan)
    }

    fn parse_page(&self, raw: &str) -> Result<PageView, CodecError> {
        (**self).parse_page(raw)
    }
}
