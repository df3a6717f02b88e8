//! Worker error types.

use thiserror::Error;

use vodarc_platform::PlatformError;
use vodarc_queue::{JobError, QueueError};
use vodarc_store::StoreError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing dependency: {0}")]
    DependencyMissing(String),

    #[error("Media runner failed: {0}")]
    Media(String),

    #[error("Invalid job arguments: {0}")]
    InvalidArgs(#[from] serde_json::Error),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn dependency_missing(what: impl Into<String>) -> Self {
        Self::DependencyMissing(what.into())
    }

    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// True for transient failures worth consuming a retry attempt.
    ///
    /// Missing dependencies, unsupported capabilities, undecodable
    /// arguments and absent entities stay fatal: retrying cannot fix them.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Platform(e) => e.is_retryable(),
            WorkerError::JobFailed(_) | WorkerError::Media(_) | WorkerError::Io(_) => true,
            WorkerError::ConfigError(_)
            | WorkerError::DependencyMissing(_)
            | WorkerError::InvalidArgs(_)
            | WorkerError::Store(_)
            | WorkerError::Queue(_) => false,
        }
    }

    /// Convert into the queue layer's retry classification.
    pub fn into_job_error(self) -> JobError {
        if self.is_retryable() {
            JobError::retryable(self.to_string())
        } else {
            JobError::fatal(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use vodarc_models::Platform;

    #[test]
    fn rate_limits_are_retryable() {
        let err = WorkerError::from(PlatformError::MaxRetriesExceeded(5));
        assert!(err.is_retryable());
        assert!(!err.into_job_error().is_fatal());
    }

    #[test]
    fn capability_and_dependency_gaps_are_fatal() {
        let err = WorkerError::from(PlatformError::not_implemented(
            Platform::Twitch,
            "chat history",
        ));
        assert!(err.into_job_error().is_fatal());

        let err = WorkerError::dependency_missing("media runner");
        assert!(err.into_job_error().is_fatal());
    }

    #[test]
    fn absent_entities_are_fatal() {
        let err = WorkerError::from(StoreError::not_found("video x"));
        assert!(err.into_job_error().is_fatal());
    }
}
