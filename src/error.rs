// src/error.rs
//! Error taxonomy for the match-scoring layer

use thiserror::Error;

/// Failures surfaced by the scoring components.
#[derive(Debug, Error)]
pub enum MatchError {
    /// A server response violated the scoring contract. Never coerced into a
    /// default score: a missing score stays absent rather than cached as 0.0.
    #[error("malformed match payload: {0}")]
    MalformedPayload(String),

    /// The scoring request itself failed, carrying the transport cause.
    #[error("match request failed: {0}")]
    RequestFailed(#[from] TransportError),

    /// The deferred result fetch exceeded its bound.
    #[error("batch result fetch timed out after {elapsed_seconds}s")]
    BatchTimedOut { elapsed_seconds: u64 },
}

/// Transport-level failures from the scoring service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl MatchError {
    /// True when retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            MatchError::MalformedPayload(_) => false,
            MatchError::RequestFailed(cause) => !matches!(
                cause,
                TransportError::Status { status, .. } if (400..500).contains(status)
            ),
            MatchError::BatchTimedOut { .. } => true,
        }
    }
}
