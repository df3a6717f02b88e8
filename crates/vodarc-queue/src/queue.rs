//! Named in-process job buffers.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tracing::debug;

use crate::error::{QueueError, QueueResult};
use crate::job::{JobId, JobInstance, JobState};
use crate::registry::JobRegistry;

#[derive(Default)]
struct Buffer {
    jobs: Mutex<VecDeque<JobInstance>>,
    notify: Notify,
}

impl Buffer {
    async fn push(&self, job: JobInstance) {
        self.jobs.lock().await.push_back(job);
        self.notify.notify_one();
    }

    async fn pop(&self) -> Option<JobInstance> {
        self.jobs.lock().await.pop_front()
    }

    async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }
}

/// Routes enqueued jobs into per-queue FIFO buffers.
///
/// Jobs within one queue are delivered in best-effort enqueue order; queues
/// progress independently. Buffers are in-process only — durability of the
/// backing queue storage is outside this layer.
pub struct JobQueue<C> {
    registry: Arc<JobRegistry<C>>,
    buffers: HashMap<&'static str, Arc<Buffer>>,
}

impl<C: Send + Sync + 'static> JobQueue<C> {
    /// Create buffers for every queue the registry names.
    pub fn new(registry: Arc<JobRegistry<C>>) -> Self {
        let buffers = registry
            .queue_names()
            .into_iter()
            .map(|name| (name, Arc::new(Buffer::default())))
            .collect();
        Self { registry, buffers }
    }

    /// Enqueue a job by kind, routed to the kind's queue.
    pub async fn enqueue(&self, kind: &str, args: serde_json::Value) -> QueueResult<JobId> {
        let descriptor = self
            .registry
            .descriptor(kind)
            .ok_or_else(|| QueueError::unknown_kind(kind))?;
        let buffer = self
            .buffers
            .get(descriptor.queue)
            .ok_or_else(|| QueueError::UnknownQueue(descriptor.queue.to_string()))?;

        let job = JobInstance::new(kind, args);
        let id = job.id.clone();
        debug!(job_id = %id, kind, queue = descriptor.queue, "Enqueued job");
        buffer.push(job).await;
        Ok(id)
    }

    /// Put a retryable job back into its queue as pending.
    pub(crate) async fn requeue(&self, mut job: JobInstance) -> QueueResult<()> {
        let descriptor = self
            .registry
            .descriptor(&job.kind)
            .ok_or_else(|| QueueError::unknown_kind(job.kind.as_str()))?;
        let buffer = self
            .buffers
            .get(descriptor.queue)
            .ok_or_else(|| QueueError::UnknownQueue(descriptor.queue.to_string()))?;

        job.state = JobState::Pending;
        buffer.push(job).await;
        Ok(())
    }

    /// Wait for and claim the next pending job of a queue.
    pub(crate) async fn next_job(&self, queue: &str) -> Option<JobInstance> {
        let buffer = self.buffers.get(queue)?;
        loop {
            if let Some(job) = buffer.pop().await {
                return Some(job);
            }
            buffer.notify.notified().await;
        }
    }

    /// Number of pending jobs in a queue.
    pub async fn len(&self, queue: &str) -> usize {
        match self.buffers.get(queue) {
            Some(buffer) => buffer.len().await,
            None => 0,
        }
    }
}
