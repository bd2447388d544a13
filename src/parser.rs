//! Protobuf parser for GTFS Realtime feeds.

use prost::Message;
use tracing::debug;

use crate::error::FeedError;
use crate::gtfs_rt::FeedMessage;

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// Fields outside the standard schema (agency extensions) are skipped.
///
/// # Errors
///
/// Returns [`FeedError::Decode`] if the bytes are not valid protobuf for a
/// `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, FeedError> {
    let feed = FeedMessage::decode(bytes)?;
    debug!(
        entities = feed.entity.len(),
        version = %feed.header.gtfs_realtime_version,
        "Feed decoded"
    );
    Ok(feed)
}
