//! The durable delayed-queue substrate contract. Storage-agnostic by
//! design: the reference deployment backs this with Redis, tests back it
//! with the in-memory [`InMemoryQueue`] below.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

/// The three named queues the engine and processors address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueName {
    Deadlines,
    Reminders,
    Escalation,
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Deadlines => "deadlines",
            Self::Reminders => "reminders",
            Self::Escalation => "escalation",
        };
        write!(f, "{s}")
    }
}

/// Per-call options for [`QueueSubstrate::add`].
#[derive(Clone, Debug)]
pub struct AddOptions {
    pub job_id: String,
    /// Milliseconds from now. Callers MUST floor this at 0 themselves;
    /// the substrate does not re-derive "now".
    pub delay_ms: u64,
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl AddOptions {
    /// Defaults from §4.2: 5 attempts, backoff starting at 1000ms.
    pub fn new(job_id: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            job_id: job_id.into(),
            delay_ms,
            attempts: 5,
            backoff_ms: 1000,
        }
    }
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue substrate unavailable: {0}")]
    Unavailable(String),
    #[error("queue substrate error: {0}")]
    Other(String),
}

/// Durable delayed-job store keyed by job identity. `add` is a no-op if a
/// pending job with the same `job_id` already exists; `cancel_by_id` is
/// idempotent.
#[async_trait]
pub trait QueueSubstrate: Send + Sync {
    async fn add(
        &self,
        queue: QueueName,
        payload: serde_json::Value,
        opts: AddOptions,
    ) -> Result<(), QueueError>;

    async fn cancel_by_id(&self, queue: QueueName, job_id: &str) -> Result<(), QueueError>;
}

/// In-memory [`QueueSubstrate`] for tests. Tracks pending job ids per queue
/// so dedup and cancellation semantics are exercised without a live Redis
/// instance.
#[derive(Default)]
pub struct InMemoryQueue {
    pending: Mutex<HashMap<QueueName, HashSet<String>>>,
    added: Mutex<Vec<(QueueName, serde_json::Value, AddOptions)>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every payload that was actually enqueued (dedup already applied),
    /// in call order.
    pub fn added_payloads(&self) -> Vec<(QueueName, serde_json::Value)> {
        self.added
            .lock()
            .unwrap()
            .iter()
            .map(|(q, p, _)| (*q, p.clone()))
            .collect()
    }

    pub fn is_pending(&self, queue: QueueName, job_id: &str) -> bool {
        self.pending
            .lock()
            .unwrap()
            .get(&queue)
            .is_some_and(|ids| ids.contains(job_id))
    }
}

#[async_trait]
impl QueueSubstrate for InMemoryQueue {
    async fn add(
        &self,
        queue: QueueName,
        payload: serde_json::Value,
        opts: AddOptions,
    ) -> Result<(), QueueError> {
        let mut pending = self.pending.lock().unwrap();
        let ids = pending.entry(queue).or_default();
        if !ids.insert(opts.job_id.clone()) {
            return Ok(());
        }
        drop(pending);
        self.added.lock().unwrap().push((queue, payload, opts));
        Ok(())
    }

    async fn cancel_by_id(&self, queue: QueueName, job_id: &str) -> Result<(), QueueError> {
        if let Some(ids) = self.pending.lock().unwrap().get_mut(&queue) {
            ids.remove(job_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_is_idempotent_by_job_id() {
        let queue = InMemoryQueue::new();
        let opts = AddOptions::new("job-1", 0);
        queue
            .add(QueueName::Deadlines, serde_json::json!({"a": 1}), opts.clone())
            .await
            .unwrap();
        queue
            .add(QueueName::Deadlines, serde_json::json!({"a": 2}), opts)
            .await
            .unwrap();
        assert_eq!(queue.added_payloads().len(), 1);
    }

    #[tokio::test]
    async fn cancel_is_idempotent_on_missing_id() {
        let queue = InMemoryQueue::new();
        queue
            .cancel_by_id(QueueName::Reminders, "nonexistent")
            .await
            .unwrap();
        assert!(!queue.is_pending(QueueName::Reminders, "nonexistent"));
    }

    #[tokio::test]
    async fn cancel_removes_pending_job() {
        let queue = InMemoryQueue::new();
        queue
            .add(
                QueueName::Escalation,
                serde_json::json!({}),
                AddOptions::new("job-2", 0),
            )
            .await
            .unwrap();
        assert!(queue.is_pending(QueueName::Escalation, "job-2"));
        queue
            .cancel_by_id(QueueName::Escalation, "job-2")
            .await
            .unwrap();
        assert!(!queue.is_pending(QueueName::Escalation, "job-2"));
    }
}
