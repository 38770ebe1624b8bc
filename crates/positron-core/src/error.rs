//! Error taxonomy shared by every core operation.
//!
//! Failures are always explicit: a provider or storage error is never
//! turned into an empty or default result. The only designed fallback is
//! the ungrounded-generation path in [`crate::retrieval`], which is not an
//! error at all.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    /// Missing credential, unknown provider, mismatched embedding dimension.
    /// Fatal at startup; never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The hosted API rejected or never received a credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network failure, timeout, or a non-success status from a backend.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The backend reported a quota or rate limit.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The backend answered, but the body could not be interpreted.
    #[error("malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),

    /// Storage I/O failure in the vector store.
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    /// The caller passed arguments the operation cannot accept.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An internal guarantee was violated (e.g. the chunker pass cap).
    #[error("internal error: {0}")]
    Internal(String),
}

impl RagError {
    /// True for the failure classes a caller may reasonably retry later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RagError::UpstreamUnavailable(_) | RagError::RateLimited(_) | RagError::IndexUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RagError>;
