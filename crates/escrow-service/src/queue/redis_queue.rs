//! Redis-backed [`QueueSubstrate`]: one delayed sorted set plus one payload
//! hash per named queue, matching §4.2. The sorted set's score is the
//! absolute fire time in epoch milliseconds; membership in the set is the
//! dedup key, so `add` only needs a single `ZSCORE` check before writing.

use async_trait::async_trait;
use escrow_core::{AddOptions, QueueError, QueueName, QueueSubstrate};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;

/// What's actually stored per pending job: the caller's payload plus the
/// retry bookkeeping the worker runtime needs to implement backoff.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub payload: Value,
    pub attempts_remaining: u32,
    pub backoff_ms: u64,
}

/// Completed jobs are kept for inspection for an hour or the last 1000
/// entries, whichever is smaller.
const COMPLETED_RETENTION_MS: i64 = 60 * 60 * 1000;
const COMPLETED_RETENTION_MAX: isize = 1000;

/// Failed jobs are kept a full day (or the last 1000) so an operator has
/// time to notice and investigate before they age out.
const FAILED_RETENTION_MS: i64 = 24 * 60 * 60 * 1000;
const FAILED_RETENTION_MAX: isize = 1000;

/// Lazily connects: `new` only parses the URL, the actual `ConnectionManager`
/// is established on first use so a boot-time Redis outage never blocks the
/// HTTP surface from coming up (§4.2, §9 — ports tolerate construction
/// without side effects until their first call).
#[derive(Clone)]
pub struct RedisQueue {
    client: redis::Client,
    manager: std::sync::Arc<OnceCell<ConnectionManager>>,
}

impl RedisQueue {
    pub fn new(redis_url: &str) -> Result<Self, QueueError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| QueueError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            manager: std::sync::Arc::new(OnceCell::new()),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, QueueError> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                self.client
                    .get_connection_manager()
                    .await
                    .map_err(|e| QueueError::Unavailable(e.to_string()))
            })
            .await?;
        Ok(manager.clone())
    }

    fn pending_key(queue: QueueName) -> String {
        format!("escrow:{queue}:pending")
    }

    fn payload_key(queue: QueueName, job_id: &str) -> String {
        format!("escrow:{queue}:payload:{job_id}")
    }

    fn completed_key(queue: QueueName) -> String {
        format!("escrow:{queue}:completed")
    }

    fn failed_key(queue: QueueName) -> String {
        format!("escrow:{queue}:failed")
    }

    /// Bounds a retention set to `max_age_ms` and `max_entries`, whichever
    /// is stricter: first drop anything older than the window, then trim
    /// by rank so only the most recent `max_entries` members survive.
    async fn trim_retention(
        conn: &mut ConnectionManager,
        key: &str,
        now_ms: i64,
        max_age_ms: i64,
        max_entries: isize,
    ) -> Result<(), QueueError> {
        let _: i64 = conn
            .zremrangebyscore(key, 0, now_ms - max_age_ms)
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        let _: i64 = conn
            .zremrangebyrank(key, 0, -(max_entries + 1))
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        Ok(())
    }

    /// Every job whose score is at or before `now_ms`, claimed one at a
    /// time by racing `ZREM`: a `1` return means this call claimed it, a
    /// `0` means a concurrent worker already did.
    pub async fn claim_due(
        &self,
        queue: QueueName,
        now_ms: i64,
        limit: isize,
    ) -> Result<Vec<(String, JobEnvelope)>, QueueError> {
        let mut conn = self.connection().await?;
        let pending = Self::pending_key(queue);

        let candidates: Vec<String> = conn
            .zrangebyscore_limit(&pending, 0, now_ms, 0, limit)
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;

        let mut claimed = Vec::new();
        for job_id in candidates {
            let removed: i64 = conn
                .zrem(&pending, &job_id)
                .await
                .map_err(|e| QueueError::Other(e.to_string()))?;
            if removed == 0 {
                continue;
            }
            let payload_key = Self::payload_key(queue, &job_id);
            let raw: Option<String> = conn
                .get(&payload_key)
                .await
                .map_err(|e| QueueError::Other(e.to_string()))?;
            let Some(raw) = raw else { continue };
            let envelope: JobEnvelope =
                serde_json::from_str(&raw).map_err(|e| QueueError::Other(e.to_string()))?;
            claimed.push((job_id, envelope));
        }
        Ok(claimed)
    }

    /// A claimed job finished successfully: drop its payload and record it
    /// in the completed set (trimmed to the retention window) for
    /// post-mortem inspection.
    pub async fn complete(&self, queue: QueueName, job_id: &str) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .del(Self::payload_key(queue, job_id))
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;

        let now_ms = chrono::Utc::now().timestamp_millis();
        let completed = Self::completed_key(queue);
        let _: () = conn
            .zadd(&completed, job_id, now_ms)
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        Self::trim_retention(
            &mut conn,
            &completed,
            now_ms,
            COMPLETED_RETENTION_MS,
            COMPLETED_RETENTION_MAX,
        )
        .await
    }

    /// A failure was classified permanent up front (the retry budget
    /// doesn't apply): drop the payload and move straight to the failed
    /// set, skipping the backoff cycle entirely.
    pub async fn fail_permanently(&self, queue: QueueName, job_id: &str) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.mark_failed(&mut conn, queue, job_id, now_ms).await
    }

    async fn mark_failed(
        &self,
        conn: &mut ConnectionManager,
        queue: QueueName,
        job_id: &str,
        now_ms: i64,
    ) -> Result<(), QueueError> {
        let payload_key = Self::payload_key(queue, job_id);
        let _: () = conn
            .del(&payload_key)
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        let failed = Self::failed_key(queue);
        let _: () = conn
            .zadd(&failed, job_id, now_ms)
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        Self::trim_retention(conn, &failed, now_ms, FAILED_RETENTION_MS, FAILED_RETENTION_MAX).await
    }

    /// A claimed job failed transiently: re-add with one fewer attempt and
    /// exponential backoff from `backoff_ms`, or move it to the failed set
    /// (retained, not retried) once attempts are exhausted.
    pub async fn retry_or_fail(
        &self,
        queue: QueueName,
        job_id: &str,
        mut envelope: JobEnvelope,
        now_ms: i64,
    ) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        if envelope.attempts_remaining <= 1 {
            return self.mark_failed(&mut conn, queue, job_id, now_ms).await;
        }

        envelope.attempts_remaining -= 1;
        envelope.backoff_ms *= 2;
        let delay_ms = envelope.backoff_ms as i64;
        let serialized =
            serde_json::to_string(&envelope).map_err(|e| QueueError::Other(e.to_string()))?;
        let payload_key = Self::payload_key(queue, job_id);
        let _: () = conn
            .set(&payload_key, serialized)
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        let _: () = conn
            .zadd(Self::pending_key(queue), job_id, now_ms + delay_ms)
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl QueueSubstrate for RedisQueue {
    async fn add(
        &self,
        queue: QueueName,
        payload: Value,
        opts: AddOptions,
    ) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        let pending = Self::pending_key(queue);

        let existing: Option<f64> = conn
            .zscore(&pending, &opts.job_id)
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        if existing.is_some() {
            return Ok(());
        }

        let envelope = JobEnvelope {
            payload,
            attempts_remaining: opts.attempts,
            backoff_ms: opts.backoff_ms,
        };
        let serialized =
            serde_json::to_string(&envelope).map_err(|e| QueueError::Other(e.to_string()))?;

        let now_ms = chrono::Utc::now().timestamp_millis();
        let fire_at_ms = now_ms + opts.delay_ms as i64;

        let payload_key = Self::payload_key(queue, &opts.job_id);
        let _: () = conn
            .set(&payload_key, serialized)
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        let _: () = conn
            .zadd(&pending, &opts.job_id, fire_at_ms)
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        Ok(())
    }

    async fn cancel_by_id(&self, queue: QueueName, job_id: &str) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        let _: i64 = conn
            .zrem(Self::pending_key(queue), job_id)
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        let _: () = conn
            .del(Self::payload_key(queue, job_id))
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;
        Ok(())
    }
}
