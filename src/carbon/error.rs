//! Error types for the carbon-intensity feed.

use thiserror::Error;

/// Errors that can occur while pulling grid data from the feed.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// Request timeout
    #[error("feed request timeout after {0}s")]
    Timeout(u64),

    /// Connection failed
    #[error("feed connection failed: {0}")]
    ConnectionFailed(String),

    /// Feed returned a non-success HTTP status
    #[error("feed HTTP error: {0}")]
    HttpError(u16),

    /// Feed payload did not parse or contained no usable generation data
    #[error("invalid feed response: {0}")]
    ParseError(String),

    /// Region has no balancing-authority mapping configured
    #[error("no balancing authority mapped for region: {0}")]
    UnmappedRegion(String),
}
