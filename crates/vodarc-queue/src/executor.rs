//! Bounded-concurrency job executor.
//!
//! Each named queue gets an independent set of worker slots; a worker claims
//! one pending job, binds the kind's deadline and runs its handler to
//! completion. Failures re-enter the queue with exponential backoff until
//! attempts run out, except fatal failures, which are discarded immediately
//! and reported through the error-observation hook.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};

use crate::backoff::BackoffPolicy;
use crate::error::JobError;
use crate::job::{JobInstance, JobState};
use crate::queue::JobQueue;
use crate::registry::{JobRegistry, Registration};

/// Hook invoked once for every discarded job.
pub type ErrorHook = Arc<dyn Fn(&JobInstance, &JobError) + Send + Sync>;

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Worker slots for queues without an explicit cap
    pub default_workers: usize,
    /// Per-queue worker slot caps
    pub queue_workers: HashMap<String, usize>,
    /// Backoff applied before a failed job re-enters its queue
    pub backoff: BackoffPolicy,
    /// Bounded wait for in-flight jobs on shutdown
    pub drain_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            default_workers: 1,
            queue_workers: HashMap::new(),
            backoff: BackoffPolicy::default(),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    /// Set the worker slot cap of one queue.
    pub fn with_queue_workers(mut self, queue: impl Into<String>, workers: usize) -> Self {
        self.queue_workers.insert(queue.into(), workers.max(1));
        self
    }

    fn workers_for(&self, queue: &str) -> usize {
        self.queue_workers
            .get(queue)
            .copied()
            .unwrap_or(self.default_workers)
            .max(1)
    }
}

/// Executes queued jobs with per-queue concurrency caps.
pub struct JobExecutor<C> {
    registry: Arc<JobRegistry<C>>,
    queue: Arc<JobQueue<C>>,
    context: Arc<C>,
    config: PoolConfig,
    shutdown: watch::Sender<bool>,
    error_hook: ErrorHook,
}

impl<C: Send + Sync + 'static> JobExecutor<C> {
    /// Create a new executor over a registry, queue and shared context.
    pub fn new(
        registry: Arc<JobRegistry<C>>,
        queue: Arc<JobQueue<C>>,
        context: Arc<C>,
        config: PoolConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        let error_hook: ErrorHook = Arc::new(|job, err| {
            error!(
                job_id = %job.id,
                kind = %job.kind,
                attempt = job.attempt,
                "Job discarded: {err}"
            );
        });
        Self {
            registry,
            queue,
            context,
            config,
            shutdown,
            error_hook,
        }
    }

    /// Replace the discard observation hook.
    pub fn with_error_hook(mut self, hook: ErrorHook) -> Self {
        self.error_hook = hook;
        self
    }

    /// Signal shutdown; `run` returns after draining in-flight jobs.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Shutdown signal receiver for collaborating loops.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Run workers for every registered queue until shutdown.
    pub async fn run(&self) {
        let queues = self.registry.queue_names();
        info!(queues = ?queues, "Starting job executor");

        let mut handles = Vec::new();
        for queue_name in queues {
            let workers = self.config.workers_for(queue_name);
            handles.push(tokio::spawn(run_queue_workers(
                queue_name,
                workers,
                Arc::clone(&self.registry),
                Arc::clone(&self.queue),
                Arc::clone(&self.context),
                self.config.backoff.clone(),
                Arc::clone(&self.error_hook),
                self.config.drain_timeout,
                self.shutdown.subscribe(),
            )));
        }

        for handle in handles {
            let _ = handle.await;
        }
        info!("Job executor stopped");
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_queue_workers<C: Send + Sync + 'static>(
    queue_name: &'static str,
    workers: usize,
    registry: Arc<JobRegistry<C>>,
    queue: Arc<JobQueue<C>>,
    context: Arc<C>,
    backoff: BackoffPolicy,
    hook: ErrorHook,
    drain_timeout: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let semaphore = Arc::new(Semaphore::new(workers));
    debug!(queue = queue_name, workers, "Queue workers started");

    loop {
        // Claim a worker slot before claiming a job, so a saturated pool
        // leaves pending jobs in the buffer instead of holding them.
        let permit = tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let job = tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
            job = queue.next_job(queue_name) => match job {
                Some(job) => job,
                None => break,
            },
        };

        let registration = match registry.get(&job.kind) {
            Some(registration) => registration.clone(),
            None => {
                warn!(kind = %job.kind, "Claimed job has no registration, dropping");
                continue;
            }
        };

        let queue = Arc::clone(&queue);
        let context = Arc::clone(&context);
        let backoff = backoff.clone();
        let hook = Arc::clone(&hook);
        tokio::spawn(async move {
            let _permit = permit;
            execute_job(registration, job, context, queue, backoff, hook).await;
        });
    }

    // Bounded wait for in-flight jobs before the queue winds down.
    let _ = tokio::time::timeout(drain_timeout, async {
        let _ = semaphore.acquire_many(workers as u32).await;
    })
    .await;
    debug!(queue = queue_name, "Queue workers stopped");
}

async fn execute_job<C: Send + Sync + 'static>(
    registration: Registration<C>,
    mut job: JobInstance,
    context: Arc<C>,
    queue: Arc<JobQueue<C>>,
    backoff: BackoffPolicy,
    hook: ErrorHook,
) {
    let descriptor = &registration.descriptor;
    job.state = JobState::Running;
    job.attempt += 1;
    debug!(job_id = %job.id, kind = %job.kind, attempt = job.attempt, "Job running");

    // A fired deadline drops the handler future, abandoning any in-flight
    // network calls along with it.
    let result = tokio::time::timeout(
        descriptor.timeout,
        (registration.handler)(context, job.args.clone()),
    )
    .await;
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(_) => Err(JobError::TimedOut(descriptor.timeout)),
    };

    match outcome {
        Ok(()) => {
            job.state = JobState::Succeeded;
            counter!(
                "queue_jobs_total",
                "kind" => job.kind.clone(),
                "outcome" => "succeeded"
            )
            .increment(1);
            info!(job_id = %job.id, kind = %job.kind, "Job succeeded");
        }
        Err(e) if e.is_fatal() || job.attempt >= descriptor.max_attempts => {
            job.state = JobState::Discarded;
            counter!(
                "queue_jobs_total",
                "kind" => job.kind.clone(),
                "outcome" => "discarded"
            )
            .increment(1);
            hook(&job, &e);
        }
        Err(e) => {
            job.state = JobState::Retryable;
            counter!(
                "queue_jobs_total",
                "kind" => job.kind.clone(),
                "outcome" => "retried"
            )
            .increment(1);
            let delay = backoff.delay_for_attempt(job.attempt);
            warn!(
                job_id = %job.id,
                kind = %job.kind,
                attempt = job.attempt,
                max_attempts = descriptor.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Job failed, retrying: {e}"
            );
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(err) = queue.requeue(job).await {
                    error!("Failed to requeue job: {err}");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::registry::JobDescriptor;

    #[derive(Default)]
    struct TestCtx {
        calls: AtomicU32,
        slow_done: AtomicU32,
        fast_done: AtomicU32,
    }

    fn descriptor(kind: &'static str, queue: &'static str, max_attempts: u32) -> JobDescriptor {
        JobDescriptor {
            kind,
            queue,
            max_attempts,
            timeout: Duration::from_secs(5),
        }
    }

    fn pool_config() -> PoolConfig {
        PoolConfig {
            backoff: BackoffPolicy {
                base: Duration::from_millis(1),
                max: Duration::from_millis(5),
            },
            drain_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    struct Harness {
        queue: Arc<JobQueue<TestCtx>>,
        ctx: Arc<TestCtx>,
        executor: Arc<JobExecutor<TestCtx>>,
        discards: Arc<AtomicU32>,
        runner: tokio::task::JoinHandle<()>,
    }

    fn start(registry: JobRegistry<TestCtx>, config: PoolConfig) -> Harness {
        let registry = Arc::new(registry);
        let queue = Arc::new(JobQueue::new(Arc::clone(&registry)));
        let ctx = Arc::new(TestCtx::default());
        let discards = Arc::new(AtomicU32::new(0));
        let hook_discards = Arc::clone(&discards);
        let executor = Arc::new(
            JobExecutor::new(registry, Arc::clone(&queue), Arc::clone(&ctx), config)
                .with_error_hook(Arc::new(move |_, _| {
                    hook_discards.fetch_add(1, Ordering::SeqCst);
                })),
        );
        let runner = {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move { executor.run().await })
        };
        Harness {
            queue,
            ctx,
            executor,
            discards,
            runner,
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !condition() {
            if tokio::time::Instant::now() > deadline {
                panic!("condition not reached within deadline");
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn stop(harness: Harness) {
        harness.executor.shutdown();
        harness.runner.await.expect("runner exits cleanly");
    }

    #[tokio::test]
    async fn runs_jobs_to_success() {
        let mut registry = JobRegistry::new();
        registry
            .register(descriptor("ok_job", "default", 3), |ctx: Arc<TestCtx>, _| async move {
                ctx.calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .expect("register");

        let harness = start(registry, pool_config());
        harness
            .queue
            .enqueue("ok_job", serde_json::json!({}))
            .await
            .expect("enqueue");

        let ctx = Arc::clone(&harness.ctx);
        wait_until(move || ctx.calls.load(Ordering::SeqCst) == 1).await;
        assert_eq!(harness.discards.load(Ordering::SeqCst), 0);
        stop(harness).await;
    }

    #[tokio::test]
    async fn retries_until_success() {
        let mut registry = JobRegistry::new();
        registry
            .register(
                descriptor("flaky_job", "default", 5),
                |ctx: Arc<TestCtx>, _| async move {
                    let n = ctx.calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(JobError::retryable("transient"))
                    } else {
                        Ok(())
                    }
                },
            )
            .expect("register");

        let harness = start(registry, pool_config());
        harness
            .queue
            .enqueue("flaky_job", serde_json::json!({}))
            .await
            .expect("enqueue");

        let ctx = Arc::clone(&harness.ctx);
        wait_until(move || ctx.calls.load(Ordering::SeqCst) == 3).await;
        assert_eq!(harness.discards.load(Ordering::SeqCst), 0);
        stop(harness).await;
    }

    #[tokio::test]
    async fn discards_after_max_attempts() {
        let mut registry = JobRegistry::new();
        registry
            .register(
                descriptor("doomed_job", "default", 2),
                |ctx: Arc<TestCtx>, _| async move {
                    ctx.calls.fetch_add(1, Ordering::SeqCst);
                    Err(JobError::retryable("always down"))
                },
            )
            .expect("register");

        let harness = start(registry, pool_config());
        harness
            .queue
            .enqueue("doomed_job", serde_json::json!({}))
            .await
            .expect("enqueue");

        let discards = Arc::clone(&harness.discards);
        wait_until(move || discards.load(Ordering::SeqCst) == 1).await;
        assert_eq!(harness.ctx.calls.load(Ordering::SeqCst), 2);
        stop(harness).await;
    }

    #[tokio::test]
    async fn fatal_errors_discard_without_retry() {
        let mut registry = JobRegistry::new();
        registry
            .register(
                descriptor("misconfigured_job", "default", 5),
                |ctx: Arc<TestCtx>, _| async move {
                    ctx.calls.fetch_add(1, Ordering::SeqCst);
                    Err(JobError::dependency_missing("live monitor"))
                },
            )
            .expect("register");

        let harness = start(registry, pool_config());
        harness
            .queue
            .enqueue("misconfigured_job", serde_json::json!({}))
            .await
            .expect("enqueue");

        let discards = Arc::clone(&harness.discards);
        wait_until(move || discards.load(Ordering::SeqCst) == 1).await;
        // One attempt only, despite five being allowed.
        assert_eq!(harness.ctx.calls.load(Ordering::SeqCst), 1);
        stop(harness).await;
    }

    #[tokio::test]
    async fn deadline_expiry_counts_as_a_retryable_failure() {
        let mut registry = JobRegistry::new();
        registry
            .register(
                JobDescriptor {
                    kind: "stuck_job",
                    queue: "default",
                    max_attempts: 2,
                    timeout: Duration::from_millis(10),
                },
                |ctx: Arc<TestCtx>, _| async move {
                    ctx.calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(())
                },
            )
            .expect("register");

        let harness = start(registry, pool_config());
        harness
            .queue
            .enqueue("stuck_job", serde_json::json!({}))
            .await
            .expect("enqueue");

        let discards = Arc::clone(&harness.discards);
        wait_until(move || discards.load(Ordering::SeqCst) == 1).await;
        assert_eq!(harness.ctx.calls.load(Ordering::SeqCst), 2);
        stop(harness).await;
    }

    #[tokio::test]
    async fn queues_progress_independently() {
        let mut registry = JobRegistry::new();
        registry
            .register(
                descriptor("slow_job", "postprocess", 1),
                |ctx: Arc<TestCtx>, _| async move {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    ctx.slow_done.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            )
            .expect("register");
        registry
            .register(
                descriptor("fast_job", "chat-render", 1),
                |ctx: Arc<TestCtx>, _| async move {
                    ctx.fast_done.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            )
            .expect("register");

        let harness = start(registry, pool_config());
        // Saturate the postprocess queue, then enqueue chat work behind it.
        harness
            .queue
            .enqueue("slow_job", serde_json::json!({}))
            .await
            .expect("enqueue");
        harness
            .queue
            .enqueue("fast_job", serde_json::json!({}))
            .await
            .expect("enqueue");

        let ctx = Arc::clone(&harness.ctx);
        wait_until(move || ctx.fast_done.load(Ordering::SeqCst) == 1).await;
        // Chat work finished while postprocess is still busy.
        assert_eq!(harness.ctx.slow_done.load(Ordering::SeqCst), 0);

        let ctx = Arc::clone(&harness.ctx);
        wait_until(move || ctx.slow_done.load(Ordering::SeqCst) == 1).await;
        stop(harness).await;
    }
}
