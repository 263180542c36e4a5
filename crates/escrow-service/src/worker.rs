//! Boots one poller per named queue, each bounded to `concurrency`
//! in-flight jobs by its own semaphore so a burst on one queue can't starve
//! the others. On shutdown signal, in-flight jobs are allowed to finish and
//! new dequeues are suspended (§4.10, §5).

use std::sync::Arc;
use std::time::Duration;

use escrow_core::{Api, ChainPolicy, Notification, ProcessorError, QueueName, process_deadline, process_escalation, process_reminder};
use escrow_types::{DeadlineJob, EscalationJob, ReminderJob};
use tokio::sync::Semaphore;

use crate::queue::redis_queue::{JobEnvelope, RedisQueue};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const CLAIM_BATCH: isize = 20;

pub struct WorkerRuntime {
    pub queue: Arc<RedisQueue>,
    pub api: Arc<dyn Api>,
    pub notifier: Arc<dyn Notification>,
    pub policy: Arc<dyn ChainPolicy>,
    pub concurrency: usize,
}

impl WorkerRuntime {
    /// Runs until `shutdown` resolves. Each named queue gets its own
    /// polling task and its own concurrency budget; all three are joined
    /// before this returns.
    pub async fn run(self, shutdown: impl std::future::Future<Output = ()>) {
        let permits = self.concurrency.max(1);
        let cancel = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let deadlines = tokio::spawn(poll_loop(
            QueueName::Deadlines,
            Arc::clone(&self.queue),
            Arc::clone(&self.api),
            Arc::clone(&self.notifier),
            Arc::clone(&self.policy),
            Arc::new(Semaphore::new(permits)),
            cancel.clone(),
        ));
        let reminders = tokio::spawn(poll_loop(
            QueueName::Reminders,
            Arc::clone(&self.queue),
            Arc::clone(&self.api),
            Arc::clone(&self.notifier),
            Arc::clone(&self.policy),
            Arc::new(Semaphore::new(permits)),
            cancel.clone(),
        ));
        let escalation = tokio::spawn(poll_loop(
            QueueName::Escalation,
            Arc::clone(&self.queue),
            Arc::clone(&self.api),
            Arc::clone(&self.notifier),
            Arc::clone(&self.policy),
            Arc::new(Semaphore::new(permits)),
            cancel.clone(),
        ));

        shutdown.await;
        tracing::info!("shutdown signal received, closing worker queues");
        cancel.store(true, std::sync::atomic::Ordering::SeqCst);

        for handle in [deadlines, reminders, escalation] {
            let _ = handle.await;
        }
    }
}

async fn poll_loop(
    queue_name: QueueName,
    queue: Arc<RedisQueue>,
    api: Arc<dyn Api>,
    notifier: Arc<dyn Notification>,
    policy: Arc<dyn ChainPolicy>,
    semaphore: Arc<Semaphore>,
    cancel: Arc<std::sync::atomic::AtomicBool>,
) {
    while !cancel.load(std::sync::atomic::Ordering::SeqCst) {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let claimed = match queue.claim_due(queue_name, now_ms, CLAIM_BATCH).await {
            Ok(jobs) => jobs,
            Err(err) => {
                tracing::warn!(%queue_name, error = %err, "claim_due failed, backing off");
                tokio::time::sleep(POLL_INTERVAL).await;
                continue;
            }
        };

        for (job_id, envelope) in claimed {
            let permit = Arc::clone(&semaphore).acquire_owned().await;
            let Ok(permit) = permit else { break };
            let queue = Arc::clone(&queue);
            let api = Arc::clone(&api);
            let notifier = Arc::clone(&notifier);
            let policy = Arc::clone(&policy);
            tokio::spawn(async move {
                let _permit = permit;
                run_one(queue_name, &queue, job_id, envelope, api.as_ref(), notifier.as_ref(), policy.as_ref()).await;
            });
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn run_one(
    queue_name: QueueName,
    queue: &RedisQueue,
    job_id: String,
    envelope: JobEnvelope,
    api: &dyn Api,
    notifier: &dyn Notification,
    policy: &dyn ChainPolicy,
) {
    let now = chrono::Utc::now().timestamp();
    let outcome = dispatch(queue_name, queue, &envelope, api, notifier, policy, now).await;

    match outcome {
        Ok(()) => {
            tracing::info!(%queue_name, job_id, "job completed");
            if let Err(err) = queue.complete(queue_name, &job_id).await {
                tracing::warn!(%queue_name, job_id, error = %err, "failed to clear completed job");
            }
        }
        Err(err) if err.is_transient() => {
            tracing::warn!(%queue_name, job_id, error = %err, "job failed transiently, retrying with backoff");
            let now_ms = chrono::Utc::now().timestamp_millis();
            if let Err(err) = queue.retry_or_fail(queue_name, &job_id, envelope, now_ms).await {
                tracing::error!(%queue_name, job_id, error = %err, "failed to requeue job");
            }
        }
        Err(err) => {
            tracing::warn!(%queue_name, job_id, error = %err, "job failed permanently, moving to failed set");
            if let Err(err) = queue.fail_permanently(queue_name, &job_id).await {
                tracing::error!(%queue_name, job_id, error = %err, "failed to record permanent failure");
            }
        }
    }
}

async fn dispatch(
    queue_name: QueueName,
    queue: &RedisQueue,
    envelope: &JobEnvelope,
    api: &dyn Api,
    notifier: &dyn Notification,
    policy: &dyn ChainPolicy,
    now: i64,
) -> Result<(), ProcessorError> {
    match queue_name {
        QueueName::Deadlines => {
            let job: DeadlineJob = serde_json::from_value(envelope.payload.clone())
                .map_err(|e| ProcessorError::InvalidPayload(e.to_string()))?;
            process_deadline(&job, api, policy, notifier, queue, now)
                .await
                .map(|_| ())
        }
        QueueName::Reminders => {
            let job: ReminderJob = serde_json::from_value(envelope.payload.clone())
                .map_err(|e| ProcessorError::InvalidPayload(e.to_string()))?;
            process_reminder(&job, api, notifier, now).await.map(|_| ())
        }
        QueueName::Escalation => {
            let job: EscalationJob = serde_json::from_value(envelope.payload.clone())
                .map_err(|e| ProcessorError::InvalidPayload(e.to_string()))?;
            process_escalation(&job, api, policy, notifier).await.map(|_| ())
        }
    }
}
