//! Error types for expert endpoint calls.

use thiserror::Error;

/// Errors that can occur when calling an expert model endpoint.
#[derive(Debug, Clone, Error)]
pub enum ExpertError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("network error: {0}")]
    Network(String),

    /// Attempt exceeded its deadline.
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Endpoint returned an error response (4xx, 5xx).
    #[error("upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Endpoint response doesn't match the expected wire format.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
