//! Job instances and their state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a job instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of a job instance.
///
/// Transitions: Pending → Running → Succeeded, or Running → Retryable →
/// Pending again (after backoff) while attempts remain, or Running →
/// Discarded once attempts are exhausted or the failure is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting in a queue buffer
    #[default]
    Pending,
    /// Claimed by a worker slot
    Running,
    /// Handler returned success
    Succeeded,
    /// Handler failed; will re-enter the queue after backoff
    Retryable,
    /// Attempts exhausted or failure fatal; terminal
    Discarded,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Retryable => "retryable",
            JobState::Discarded => "discarded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Discarded)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One enqueued unit of work.
///
/// Owned by the queue buffer until a worker claims it; the claiming worker
/// then holds exclusive mutation rights for that attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInstance {
    /// Unique job id
    pub id: JobId,
    /// Wire identifier of the job kind
    pub kind: String,
    /// Kind-specific arguments
    pub args: serde_json::Value,
    /// Attempts started so far
    pub attempt: u32,
    /// Current state
    pub state: JobState,
    /// When the job was first enqueued
    pub enqueued_at: DateTime<Utc>,
}

impl JobInstance {
    /// Create a pending job instance.
    pub fn new(kind: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            id: JobId::new(),
            kind: kind.into(),
            args,
            attempt: 0,
            state: JobState::Pending,
            enqueued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_instance_serde_round_trip() {
        let job = JobInstance::new("download_video", serde_json::json!({"video_id": "v1"}));
        let json = serde_json::to_string(&job).expect("serialize JobInstance");
        let decoded: JobInstance = serde_json::from_str(&json).expect("deserialize JobInstance");

        assert_eq!(decoded.id, job.id);
        assert_eq!(decoded.kind, "download_video");
        assert_eq!(decoded.state, JobState::Pending);
        assert_eq!(decoded.attempt, 0);
    }

    #[test]
    fn terminal_states() {
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Discarded.is_terminal());
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(!JobState::Retryable.is_terminal());
    }
}
