//! Fixed-interval recurring job enqueueing.
//!
//! Each rule fires on its own timer, independent of any queue backlog, and
//! may additionally request an immediate first firing at scheduler start.
//! Enqueue failures are logged, never fatal to the process.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::queue::JobQueue;

/// Factory producing the arguments for one periodic firing.
pub type ArgsFactory = Arc<dyn Fn() -> serde_json::Value + Send + Sync>;

/// One interval-triggered enqueue rule.
#[derive(Clone)]
pub struct PeriodicJob {
    /// Job kind to enqueue
    pub kind: &'static str,
    /// Firing interval
    pub interval: Duration,
    /// Fire once immediately at scheduler start
    pub run_on_start: bool,
    /// Argument factory invoked per firing
    pub args: ArgsFactory,
}

impl PeriodicJob {
    /// Create a rule with an argument factory.
    pub fn new<F>(kind: &'static str, every: Duration, args: F) -> Self
    where
        F: Fn() -> serde_json::Value + Send + Sync + 'static,
    {
        Self {
            kind,
            interval: every,
            run_on_start: false,
            args: Arc::new(args),
        }
    }

    /// Request an immediate first firing.
    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }
}

/// Enqueues a fixed set of recurring jobs on their intervals.
pub struct PeriodicScheduler<C> {
    queue: Arc<JobQueue<C>>,
    jobs: Vec<PeriodicJob>,
}

impl<C: Send + Sync + 'static> PeriodicScheduler<C> {
    /// Create a scheduler over the given rules.
    pub fn new(queue: Arc<JobQueue<C>>, jobs: Vec<PeriodicJob>) -> Self {
        Self { queue, jobs }
    }

    /// Run every rule on its own timer until the shutdown signal fires.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        info!(rules = self.jobs.len(), "Starting periodic scheduler");

        let mut handles = Vec::new();
        for job in self.jobs {
            let queue = Arc::clone(&self.queue);
            let shutdown = shutdown.clone();
            handles.push(tokio::spawn(run_rule(job, queue, shutdown)));
        }
        for handle in handles {
            let _ = handle.await;
        }
        info!("Periodic scheduler stopped");
    }
}

async fn run_rule<C: Send + Sync + 'static>(
    job: PeriodicJob,
    queue: Arc<JobQueue<C>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(job.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first interval tick completes immediately; consume it unless the
    // rule asked to fire at start.
    if !job.run_on_start {
        ticker.tick().await;
    }

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                match queue.enqueue(job.kind, (job.args)()).await {
                    Ok(id) => debug!(job_id = %id, kind = job.kind, "Periodic enqueue"),
                    Err(e) => warn!(kind = job.kind, "Periodic enqueue failed: {e}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::registry::{JobDescriptor, JobRegistry};

    fn queue_with_kind(kind: &'static str) -> Arc<JobQueue<()>> {
        let mut registry = JobRegistry::new();
        registry
            .register(
                JobDescriptor {
                    kind,
                    queue: "default",
                    max_attempts: 1,
                    timeout: Duration::from_secs(5),
                },
                |_, _| async { Ok(()) },
            )
            .expect("register");
        Arc::new(JobQueue::new(Arc::new(registry)))
    }

    #[tokio::test]
    async fn fires_on_interval() {
        let queue = queue_with_kind("health_check");
        let rule = PeriodicJob::new("health_check", Duration::from_millis(20), || {
            serde_json::json!({})
        });
        let scheduler = PeriodicScheduler::new(Arc::clone(&queue), vec![rule]);

        let (tx, rx) = watch::channel(false);
        let runner = tokio::spawn(scheduler.run(rx));
        tokio::time::sleep(Duration::from_millis(70)).await;
        tx.send(true).expect("signal shutdown");
        runner.await.expect("scheduler exits");

        // ~70ms at a 20ms interval without run_on_start: at least two firings.
        assert!(queue.len("default").await >= 2);
    }

    #[tokio::test]
    async fn run_on_start_fires_immediately() {
        let queue = queue_with_kind("health_check");
        let rule = PeriodicJob::new("health_check", Duration::from_secs(3600), || {
            serde_json::json!({})
        })
        .with_run_on_start(true);
        let scheduler = PeriodicScheduler::new(Arc::clone(&queue), vec![rule]);

        let (tx, rx) = watch::channel(false);
        let runner = tokio::spawn(scheduler.run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).expect("signal shutdown");
        runner.await.expect("scheduler exits");

        assert_eq!(queue.len("default").await, 1);
    }

    #[tokio::test]
    async fn unknown_kind_is_logged_not_fatal() {
        let queue = queue_with_kind("health_check");
        let rule = PeriodicJob::new("not_registered", Duration::from_millis(10), || {
            serde_json::json!({})
        })
        .with_run_on_start(true);
        let scheduler = PeriodicScheduler::new(Arc::clone(&queue), vec![rule]);

        let (tx, rx) = watch::channel(false);
        let runner = tokio::spawn(scheduler.run(rx));
        tokio::time::sleep(Duration::from_millis(40)).await;
        tx.send(true).expect("signal shutdown");
        // The scheduler keeps running through enqueue failures.
        runner.await.expect("scheduler exits cleanly");
    }
}
