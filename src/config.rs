//! Environment-driven configuration

const DEFAULT_USERNAME: &str = "username";
const DEFAULT_PASSWORD: &str = "password";

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Company data file the poller should open; empty means "whatever
    /// is already open."
    pub company_file: String,
    pub page_size: u32,
    /// Entity to query, e.g. `Customer` or `Invoice`.
    pub query_entity: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("LEDGERLINK_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8647),
            username: std::env::var("LEDGERLINK_USERNAME")
                .unwrap_or_else(|_| DEFAULT_USERNAME.to_string()),
            password: std::env::var("LEDGERLINK_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_PASSWORD.to_string()),
            company_file: std::env::var("LEDGERLINK_COMPANY_FILE").unwrap_or_default(),
            page_size: std::env::var("LEDGERLINK_PAGE_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(2),
            query_entity: std::env::var("LEDGERLINK_QUERY")
                .unwrap_or_else(|_| "Customer".to_string()),
        }
    }

    /// True when nobody configured real credentials.
    pub fn default_credentials(&self) -> bool {
        self.username == DEFAULT_USERNAME && self.password == DEFAULT_PASSWORD
    }
}
