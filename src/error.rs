//! Failure classification for loading and decoding a feed.

/// Errors raised while fetching, reading or decoding a GTFS-RT feed.
///
/// Every variant is fatal to a single invocation; nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset, ...)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint rejected an unauthenticated request
    #[error("HTTP {status}: this endpoint appears to require an API key, set MTA_API_KEY and retry")]
    AuthRequired { status: u16 },

    /// Any other non-success HTTP status
    #[error("HTTP error status {status}")]
    Status { status: u16 },

    #[error("invalid feed URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The payload is not a valid `FeedMessage`
    #[error("malformed feed payload: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FeedError {
    /// True when the failure means a key must be supplied before retrying.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, FeedError::AuthRequired { .. })
    }
}
