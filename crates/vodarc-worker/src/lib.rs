//! Archival job handlers and worker wiring.
//!
//! Ties the platform sources, the archive store and the job orchestration
//! engine together: the typed dependency context, the job kind table, the
//! pipeline/reconciliation handlers and the worker configuration.

pub mod config;
pub mod context;
pub mod error;
pub mod jobs;
pub mod media;

mod archive;
mod backfill;
mod channels;
mod reconcile;
mod watchdog;

#[cfg(test)]
pub(crate) mod testing;

pub use config::WorkerConfig;
pub use context::{Deps, LiveMonitor};
pub use error::{WorkerError, WorkerResult};
pub use jobs::{kinds, periodic_jobs, pool_config, queues, register_all, VideoJobArgs};
pub use media::{CommandMediaRunner, MediaRunner};
