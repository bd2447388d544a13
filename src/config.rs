//! Defaults and environment lookups for the arrivals CLI.

use std::time::Duration;

/// MTA NYCT feed carrying the A, C and E lines.
pub const FEED_URL_DEFAULT: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-ace";

pub const DEFAULT_ROUTE: &str = "A";

/// 145 St, uptown platform.
pub const DEFAULT_STOP: &str = "A12N";

pub const DEFAULT_LIMIT: usize = 10;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header the MTA endpoints read the API key from.
pub const API_KEY_HEADER: &str = "x-api-key";

pub const API_KEY_ENV: &str = "MTA_API_KEY";

pub const LOG_FILE_ENV: &str = "LOG_FILE_PATH";

pub const DEFAULT_LOG_FILE: &str = "logs/gtfs_rt_arrivals.log";

pub const USER_AGENT: &str = concat!("gtfs_rt_arrivals/", env!("CARGO_PKG_VERSION"));

/// Everything needed to load one feed snapshot.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// URL (anything starting with `http`) or a local file path
    pub source: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl FeedConfig {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = normalize_key(api_key);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_remote(&self) -> bool {
        self.source.starts_with("http")
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new(FEED_URL_DEFAULT)
    }
}

/// Reads the API key from `MTA_API_KEY`. An empty value counts as unset.
pub fn api_key_from_env() -> Option<String> {
    normalize_key(std::env::var(API_KEY_ENV).ok())
}

/// Log file location, overridable through `LOG_FILE_PATH`.
pub fn log_file_path() -> String {
    std::env::var(LOG_FILE_ENV).unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string())
}

fn normalize_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}
