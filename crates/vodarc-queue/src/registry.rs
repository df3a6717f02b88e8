//! Data-driven job descriptor registry.
//!
//! One table maps each job kind to its queue, retry/timeout policy and
//! handler. Registration happens once at process start and the registry is
//! immutable afterwards; a duplicate kind name is a startup error.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{JobError, QueueError, QueueResult};

/// Boxed future returned by job handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), JobError>> + Send>>;

/// Type-erased job handler over a shared dependency context `C`.
pub type Handler<C> = Arc<dyn Fn(Arc<C>, serde_json::Value) -> HandlerFuture + Send + Sync>;

/// Static metadata of one job kind.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    /// Unique wire identifier
    pub kind: &'static str,
    /// Queue the kind is dispatched to
    pub queue: &'static str,
    /// Maximum attempts before discard
    pub max_attempts: u32,
    /// Wall-clock execution deadline per attempt
    pub timeout: Duration,
}

pub(crate) struct Registration<C> {
    pub descriptor: JobDescriptor,
    pub handler: Handler<C>,
}

impl<C> Clone for Registration<C> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Registry of all job kinds, generic over the dependency-context type so
/// the scheduler stays agnostic of what handlers actually need.
pub struct JobRegistry<C> {
    entries: HashMap<&'static str, Registration<C>>,
}

impl<C> Default for JobRegistry<C> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<C: Send + Sync + 'static> JobRegistry<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job kind with its handler.
    pub fn register<F, Fut>(&mut self, descriptor: JobDescriptor, handler: F) -> QueueResult<()>
    where
        F: Fn(Arc<C>, serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        if self.entries.contains_key(descriptor.kind) {
            return Err(QueueError::duplicate_kind(descriptor.kind));
        }
        let handler: Handler<C> = Arc::new(move |ctx, args| Box::pin(handler(ctx, args)));
        self.entries
            .insert(descriptor.kind, Registration { descriptor, handler });
        Ok(())
    }

    /// Look up the descriptor of a kind.
    pub fn descriptor(&self, kind: &str) -> Option<&JobDescriptor> {
        self.entries.get(kind).map(|r| &r.descriptor)
    }

    /// All registered kinds.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<&'static str> = self.entries.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Distinct queue names across all registered kinds.
    pub fn queue_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .entries
            .values()
            .map(|r| r.descriptor.queue)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub(crate) fn get(&self, kind: &str) -> Option<&Registration<C>> {
        self.entries.get(kind)
    }
}
