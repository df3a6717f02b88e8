//! Platform error types.

use thiserror::Error;
use vodarc_models::Platform;

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors that can occur while talking to a streaming platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited by platform")]
    RateLimited,

    #[error("Max retries reached after {0} attempts")]
    MaxRetriesExceeded(u32),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("{platform} does not support {capability}")]
    NotImplemented {
        platform: Platform,
        capability: &'static str,
    },

    #[error("Decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlatformError {
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn not_implemented(platform: Platform, capability: &'static str) -> Self {
        Self::NotImplemented {
            platform,
            capability,
        }
    }

    /// Check if the error is transient and worth retrying at the job layer.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlatformError::Network(_)
                | PlatformError::RateLimited
                | PlatformError::MaxRetriesExceeded(_)
                | PlatformError::Io(_)
        )
    }

    /// True if the error carries the given HTTP status.
    pub fn has_status(&self, expected: u16) -> bool {
        matches!(self, PlatformError::UnexpectedStatus { status, .. } if *status == expected)
    }
}
