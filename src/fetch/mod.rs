//! Feed retrieval: one HTTP GET, or a read from the local filesystem.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderValue};
use tracing::debug;

use crate::error::FeedError;

/// Issues a GET for `url` and returns the raw response body.
///
/// # Errors
///
/// A 401 or 403 from a client that sent no credentials becomes
/// [`FeedError::AuthRequired`]; every other non-success status becomes
/// [`FeedError::Status`].
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes, FeedError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FeedError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let mut req = reqwest::Request::new(reqwest::Method::GET, parsed);
    req.headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("application/x-protobuf"));

    let resp = client.execute(req).await?;
    let status = resp.status();
    debug!(status = status.as_u16(), "Feed response received");

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        && !client.is_authenticated()
    {
        return Err(FeedError::AuthRequired {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(FeedError::Status {
            status: status.as_u16(),
        });
    }

    let bytes = resp.bytes().await?;
    debug!(bytes = bytes.len(), "Feed body read");
    Ok(bytes)
}

/// Loads feed bytes from a URL (anything starting with `http`) or a local file.
#[tracing::instrument(skip_all, fields(source = %source))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Bytes, FeedError> {
    if source.starts_with("http") {
        fetch_bytes(client, source).await
    } else {
        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| FeedError::Io {
                path: source.to_string(),
                source: e,
            })?;
        debug!(bytes = bytes.len(), "Feed read from file");
        Ok(Bytes::from(bytes))
    }
}
