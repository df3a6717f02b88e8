//! Queue and job error types.

use std::time::Duration;

use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors raised by the queue/registry layer itself.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Duplicate job kind: {0}")]
    DuplicateKind(String),

    #[error("Unknown job kind: {0}")]
    UnknownKind(String),

    #[error("Unknown queue: {0}")]
    UnknownQueue(String),

    #[error("Queue is shutting down")]
    ShuttingDown,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QueueError {
    pub fn duplicate_kind(kind: impl Into<String>) -> Self {
        Self::DuplicateKind(kind.into())
    }

    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownKind(kind.into())
    }
}

/// Error returned by a job handler, classified for the retry policy.
///
/// Retryable errors consume an attempt and re-enter the queue with backoff;
/// fatal errors (missing collaborator, unsupported capability, undecodable
/// arguments) discard the job immediately without consuming the attempts
/// reserved for transient failures.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job failed: {0}")]
    Retryable(String),

    #[error("Job failed permanently: {0}")]
    Fatal(String),

    #[error("Job timed out after {0:?}")]
    TimedOut(Duration),
}

impl JobError {
    pub fn retryable(msg: impl Into<String>) -> Self {
        Self::Retryable(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Missing collaborator in the dependency context. A configuration
    /// error, never a transient one.
    pub fn dependency_missing(what: impl std::fmt::Display) -> Self {
        Self::Fatal(format!("missing dependency: {what}"))
    }

    /// True when the job must be discarded without retry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, JobError::Fatal(_))
    }
}
