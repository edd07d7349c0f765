//! Credential policy and connector version gate

use async_trait::async_trait;
use semver::Version;
use std::sync::Arc;

/// Decision from the credential policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// Credentials accepted; open a session against this company file.
    /// An empty locator means "whichever file is already open."
    Accept { company_file: String },

    /// Credentials accepted but nothing is queued for this caller, so no
    /// session opens.
    #[allow(dead_code)] // StaticCredentials never returns it; richer policies do
    NoWork,

    /// Credentials rejected.
    Reject,
}

/// Validates poller credentials.
///
/// Arguments arrive already trimmed of surrounding whitespace.
#[async_trait]
pub trait CredentialPolicy: Send + Sync {
    async fn evaluate(&self, username: &str, password: &str) -> AuthDecision;
}

#[async_trait]
impl<T: CredentialPolicy + ?Sized> CredentialPolicy for Arc<T> {
    async fn evaluate(&self, username: &str, password: &str) -> AuthDecision {
        (**self).evaluate(username, password).await
    }
}

/// Fixed credential pair from configuration
pub struct StaticCredentials {
    username: String,
    password: String,
    company_file: String,
}

impl StaticCredentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        company_file: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            company_file: company_file.into(),
        }
    }
}

#[async_trait]
impl CredentialPolicy for StaticCredentials {
    async fn evaluate(&self, username: &str, password: &str) -> AuthDecision {
        if username == self.username && password == self.password {
            AuthDecision::Accept {
                company_file: self.company_file.clone(),
            }
        } else {
            AuthDecision::Reject
        }
    }
}

// ============================================================
// Connector Version Gate
// ============================================================

/// Oldest connector version this server still talks to.
const MINIMUM_SUPPORTED: (u64, u64, u64) = (1, 0, 0);

/// Connectors older than this work but should upgrade.
const RECOMMENDED: (u64, u64, u64) = (2, 0, 1);

/// Verdict on the poller's reported version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionVerdict {
    /// Current enough; proceed silently.
    Proceed,
    /// Usable but older than recommended.
    Outdated,
    /// Below the supported floor.
    Unsupported,
}

/// This server's own version, reported to the poller on request.
pub fn server_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Gate an incoming connector version string.
///
/// The connector reports four dot-separated segments; only the first
/// three form a comparable version. A string that does not parse lets
/// the connector proceed, since blocking it would strand an otherwise
/// working install.
pub fn client_version_verdict(raw: &str) -> VersionVerdict {
    let normalized = raw.trim().split('.').take(3).collect::<Vec<_>>().join(".");
    let Ok(version) = Version::parse(&normalized) else {
        tracing::warn!(version = %raw, "Unreadable connector version, letting it proceed");
        return VersionVerdict::Proceed;
    };

    let (major, minor, patch) = MINIMUM_SUPPORTED;
    if version < Version::new(major, minor, patch) {
        return VersionVerdict::Unsupported;
    }
    let (major, minor, patch) = RECOMMENDED;
    if version < Version::new(major, minor, patch) {
        return VersionVerdict::Outdated;
    }
    VersionVerdict::Proceed
}
