//! The scheduling engine: translates a `(deal, snapshot, event)` triple
//! into the timer set of §4.3, and cancels all outstanding timers for a
//! deal once it reaches a terminal state.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use escrow_types::{
    Audience, DeadlineJob, DeadlineKind, EscalationJob, EscalationReason, ReminderJob,
    ReminderReason, SchedulingPlan, Suggested, WebhookEffect, deadline_job_id, escalation_job_id,
    reminder_job_id,
};
use escrow_types::{DealSnapshot, DealState};

use crate::queue::{AddOptions, QueueError, QueueName, QueueSubstrate};

/// Last-seen `(deadline_at, nonce)` for a `(deal_id, kind)` pair. A
/// convenience cache for the nonce-bumping protocol, not a correctness
/// dependency: a fresh engine simply starts every deadline at nonce 0
/// again, which is a safe no-op against an already-pending job of the same
/// identity.
type NonceKey = (String, DeadlineKind);

pub struct SchedulingEngine<Q> {
    queue: Q,
    last_deadline: Mutex<HashMap<NonceKey, (i64, u32)>>,
    tracked: Mutex<HashMap<String, HashSet<(QueueName, String)>>>,
}

impl<Q: QueueSubstrate> SchedulingEngine<Q> {
    pub fn new(queue: Q) -> Self {
        Self {
            queue,
            last_deadline: Mutex::new(HashMap::new()),
            tracked: Mutex::new(HashMap::new()),
        }
    }

    /// Compute and emit the timer set for `event` against `snapshot`, per
    /// `plan`. `now` is unix seconds.
    pub async fn schedule(
        &self,
        deal_id: &str,
        snapshot: &DealSnapshot,
        event: &WebhookEffect,
        plan: &SchedulingPlan,
        now: i64,
    ) -> Result<(), QueueError> {
        if snapshot.is_terminal() {
            self.cancel_deal(deal_id).await?;
            return Ok(());
        }

        match event {
            WebhookEffect::DealFunded { .. } => {
                if let Some(delivery_by) = snapshot.delivery_by {
                    if delivery_by > now {
                        self.emit_deadline(deal_id, delivery_by, DeadlineKind::Delivery, now)
                            .await?;
                        self.emit_reminders(
                            deal_id,
                            delivery_by,
                            &plan.delivery_reminder_offsets_minutes,
                            ReminderReason::DeadlineUpcoming,
                            now,
                        )
                        .await?;
                    }
                }
            }
            WebhookEffect::DealDelivered { .. } => {
                if let Some(dispute_until) = snapshot.dispute_until {
                    if dispute_until > now {
                        self.emit_deadline(deal_id, dispute_until, DeadlineKind::Dispute, now)
                            .await?;
                        self.emit_reminders(
                            deal_id,
                            dispute_until,
                            &plan.dispute_reminder_offsets_minutes,
                            ReminderReason::DisputeWindowClosing,
                            now,
                        )
                        .await?;
                        if let Some(offset) = plan.escalation_after_dispute_minutes {
                            self.emit_standalone_escalation(deal_id, dispute_until, offset, now)
                                .await?;
                        }
                    }
                }
            }
            WebhookEffect::DealDisputed { .. }
            | WebhookEffect::DealReleased { .. }
            | WebhookEffect::DealRefunded { .. } => {}
        }

        if matches!(
            snapshot.state,
            DealState::Resolved | DealState::Released | DealState::Refunded
        ) {
            self.cancel_deal(deal_id).await?;
        }

        Ok(())
    }

    /// Cancel every timer this engine instance has emitted for `deal_id`.
    pub async fn cancel_deal(&self, deal_id: &str) -> Result<(), QueueError> {
        let ids: Vec<(QueueName, String)> = self
            .tracked
            .lock()
            .unwrap()
            .remove(deal_id)
            .into_iter()
            .flatten()
            .collect();
        for (queue, job_id) in ids {
            self.queue.cancel_by_id(queue, &job_id).await?;
        }
        Ok(())
    }

    async fn emit_deadline(
        &self,
        deal_id: &str,
        deadline_at: i64,
        kind: DeadlineKind,
        now: i64,
    ) -> Result<(), QueueError> {
        let key: NonceKey = (deal_id.to_string(), kind);
        let nonce = {
            let mut last = self.last_deadline.lock().unwrap();
            match last.get(&key) {
                Some((prior_deadline, prior_nonce)) if *prior_deadline != deadline_at => {
                    let prior_nonce = *prior_nonce;
                    let prior_job = DeadlineJob {
                        deal_id: deal_id.to_string(),
                        deadline_at: *prior_deadline,
                        kind,
                        nonce: prior_nonce,
                    };
                    let prior_id = deadline_job_id(&prior_job);
                    drop(last);
                    self.queue
                        .cancel_by_id(QueueName::Deadlines, &prior_id)
                        .await?;
                    self.untrack(deal_id, QueueName::Deadlines, &prior_id);
                    let new_nonce = prior_nonce + 1;
                    self.last_deadline
                        .lock()
                        .unwrap()
                        .insert(key, (deadline_at, new_nonce));
                    new_nonce
                }
                Some((_, prior_nonce)) => *prior_nonce,
                None => {
                    last.insert(key, (deadline_at, 0));
                    0
                }
            }
        };

        let job = DeadlineJob {
            deal_id: deal_id.to_string(),
            deadline_at,
            kind,
            nonce,
        };
        let job_id = deadline_job_id(&job);
        let delay_ms = floor_delay_ms(deadline_at, now);
        self.queue
            .add(
                QueueName::Deadlines,
                serde_json::to_value(&job).expect("DeadlineJob always serializes"),
                AddOptions::new(job_id.clone(), delay_ms),
            )
            .await?;
        self.track(deal_id, QueueName::Deadlines, job_id);
        Ok(())
    }

    async fn emit_reminders(
        &self,
        deal_id: &str,
        deadline_at: i64,
        offsets_minutes: &[i64],
        reason: ReminderReason,
        now: i64,
    ) -> Result<(), QueueError> {
        for &offset in offsets_minutes {
            let notify_at = deadline_at - offset * 60;
            if notify_at <= now {
                continue;
            }
            let job = ReminderJob {
                deal_id: deal_id.to_string(),
                notify_at,
                audience: Audience::Both,
                reason,
            };
            let job_id = reminder_job_id(&job);
            let delay_ms = floor_delay_ms(notify_at, now);
            self.queue
                .add(
                    QueueName::Reminders,
                    serde_json::to_value(&job).expect("ReminderJob always serializes"),
                    AddOptions::new(job_id.clone(), delay_ms),
                )
                .await?;
            self.track(deal_id, QueueName::Reminders, job_id);
        }
        Ok(())
    }

    /// Full-plan mode's standalone escalation timer, independent of the
    /// deadline job's own firing. Scheduled with the conservative
    /// `REVIEW` suggestion: at schedule time the engine has no visibility
    /// into what the snapshot will look like when the timer fires, so it
    /// defers the release/refund/review judgment entirely to whichever
    /// processor runs first — the deadline job if it still exists, or this
    /// escalation if the deadline job was already cancelled.
    async fn emit_standalone_escalation(
        &self,
        deal_id: &str,
        dispute_until: i64,
        offset_minutes: i64,
        now: i64,
    ) -> Result<(), QueueError> {
        let fire_at = dispute_until + offset_minutes * 60;
        let job = EscalationJob {
            deal_id: deal_id.to_string(),
            reason: EscalationReason::DeadlineExpired,
            suggested: Suggested::Review,
        };
        let job_id = escalation_job_id(&job);
        let delay_ms = floor_delay_ms(fire_at, now);
        self.queue
            .add(
                QueueName::Escalation,
                serde_json::to_value(&job).expect("EscalationJob always serializes"),
                AddOptions::new(job_id.clone(), delay_ms),
            )
            .await?;
        self.track(deal_id, QueueName::Escalation, job_id);
        Ok(())
    }

    fn track(&self, deal_id: &str, queue: QueueName, job_id: String) {
        self.tracked
            .lock()
            .unwrap()
            .entry(deal_id.to_string())
            .or_default()
            .insert((queue, job_id));
    }

    fn untrack(&self, deal_id: &str, queue: QueueName, job_id: &str) {
        if let Some(ids) = self.tracked.lock().unwrap().get_mut(deal_id) {
            ids.remove(&(queue, job_id.to_string()));
        }
    }
}

/// Past deadlines collapse to `delay_ms = 0`, never negative.
fn floor_delay_ms(target_at: i64, now: i64) -> u64 {
    let delta = target_at - now;
    if delta <= 0 {
        0
    } else {
        delta as u64 * 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::InMemoryQueue;
    use escrow_types::DealState;

    fn snapshot(state: DealState, delivery_by: Option<i64>, dispute_until: Option<i64>) -> DealSnapshot {
        DealSnapshot::new("D-1", state, delivery_by, dispute_until).unwrap()
    }

    #[tokio::test]
    async fn funded_event_schedules_deadline_and_reminder() {
        let engine = SchedulingEngine::new(InMemoryQueue::new());
        let snap = snapshot(DealState::Funded, Some(1_000_000 + 72 * 3600), None);
        let event = WebhookEffect::DealFunded {
            deal_id: "D-1".into(),
        };
        engine
            .schedule("D-1", &snap, &event, &SchedulingPlan::default(), 1_000_000)
            .await
            .unwrap();

        let added = engine.queue.added_payloads();
        assert_eq!(added.len(), 2);
        assert!(added.iter().any(|(q, _)| *q == QueueName::Deadlines));
        assert!(added.iter().any(|(q, _)| *q == QueueName::Reminders));
    }

    #[tokio::test]
    async fn past_delivery_by_emits_nothing() {
        let engine = SchedulingEngine::new(InMemoryQueue::new());
        let snap = snapshot(DealState::Funded, Some(999_999), None);
        let event = WebhookEffect::DealFunded {
            deal_id: "D-1".into(),
        };
        engine
            .schedule("D-1", &snap, &event, &SchedulingPlan::default(), 1_000_000)
            .await
            .unwrap();
        assert!(engine.queue.added_payloads().is_empty());
    }

    #[tokio::test]
    async fn rescheduling_with_different_deadline_bumps_nonce_and_cancels_prior() {
        let engine = SchedulingEngine::new(InMemoryQueue::new());
        let event = WebhookEffect::DealFunded {
            deal_id: "D-1".into(),
        };
        let plan = SchedulingPlan {
            delivery_reminder_offsets_minutes: vec![],
            dispute_reminder_offsets_minutes: vec![],
            escalation_after_dispute_minutes: None,
        };

        let snap_a = snapshot(DealState::Funded, Some(2_000_000), None);
        engine
            .schedule("D-1", &snap_a, &event, &plan, 1_000_000)
            .await
            .unwrap();
        assert!(engine.queue.is_pending(
            QueueName::Deadlines,
            &deadline_job_id(&DeadlineJob {
                deal_id: "D-1".into(),
                deadline_at: 2_000_000,
                kind: DeadlineKind::Delivery,
                nonce: 0,
            })
        ));

        let snap_b = snapshot(DealState::Funded, Some(3_000_000), None);
        engine
            .schedule("D-1", &snap_b, &event, &plan, 1_000_000)
            .await
            .unwrap();

        assert!(!engine.queue.is_pending(
            QueueName::Deadlines,
            &deadline_job_id(&DeadlineJob {
                deal_id: "D-1".into(),
                deadline_at: 2_000_000,
                kind: DeadlineKind::Delivery,
                nonce: 0,
            })
        ));
        assert!(engine.queue.is_pending(
            QueueName::Deadlines,
            &deadline_job_id(&DeadlineJob {
                deal_id: "D-1".into(),
                deadline_at: 3_000_000,
                kind: DeadlineKind::Delivery,
                nonce: 1,
            })
        ));
    }

    #[tokio::test]
    async fn terminal_snapshot_cancels_tracked_timers() {
        let engine = SchedulingEngine::new(InMemoryQueue::new());
        let funded_event = WebhookEffect::DealFunded {
            deal_id: "D-1".into(),
        };
        let snap = snapshot(DealState::Funded, Some(2_000_000), None);
        engine
            .schedule("D-1", &snap, &funded_event, &SchedulingPlan::default(), 1_000_000)
            .await
            .unwrap();
        assert!(!engine.queue.added_payloads().is_empty());

        let released = snapshot(DealState::Released, None, None);
        let release_event = WebhookEffect::DealReleased {
            deal_id: "D-1".into(),
        };
        engine
            .schedule(
                "D-1",
                &released,
                &release_event,
                &SchedulingPlan::default(),
                1_000_000,
            )
            .await
            .unwrap();

        assert!(!engine.queue.is_pending(
            QueueName::Deadlines,
            &deadline_job_id(&DeadlineJob {
                deal_id: "D-1".into(),
                deadline_at: 2_000_000,
                kind: DeadlineKind::Delivery,
                nonce: 0,
            })
        ));
    }

    #[test]
    fn delay_floors_at_zero_for_past_targets() {
        assert_eq!(floor_delay_ms(900, 1000), 0);
        assert_eq!(floor_delay_ms(1000, 1000), 0);
        assert_eq!(floor_delay_ms(1005, 1000), 5000);
    }
}
