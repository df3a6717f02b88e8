//! Job orchestration engine.
//!
//! This crate provides:
//! - A data-driven registry mapping job kinds to queue/retry/timeout policy
//! - Named in-process queue buffers with best-effort FIFO delivery
//! - A worker pool with independent per-queue concurrency caps
//! - Exponential retry backoff and an error-observation hook for discards
//! - A fixed-interval periodic scheduler

pub mod backoff;
pub mod error;
pub mod executor;
pub mod job;
pub mod periodic;
pub mod queue;
pub mod registry;

pub use backoff::BackoffPolicy;
pub use error::{JobError, QueueError, QueueResult};
pub use executor::{ErrorHook, JobExecutor, PoolConfig};
pub use job::{JobId, JobInstance, JobState};
pub use periodic::{ArgsFactory, PeriodicJob, PeriodicScheduler};
pub use queue::JobQueue;
pub use registry::{Handler, HandlerFuture, JobDescriptor, JobRegistry};
