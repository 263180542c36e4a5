//! Decision logic for a fired [`DeadlineJob`]. Pure function of
//! `(payload, snapshot, now, policy)` plus the side effects the decision
//! table calls for — no state survives between invocations.

use escrow_types::{
    DealState, DeadlineJob, DeadlineKind, EscalationJob, EscalationReason, Suggested,
    escalation_job_id,
};

use crate::error::ProcessorError;
use crate::ports::{Api, ChainPolicy, FinalizeAction, Notification};
use crate::queue::{AddOptions, QueueName, QueueSubstrate};

/// Outcome of evaluating a deadline job, mirroring the `{action, reason?,
/// suggested?}` logging shape of §4.7/§8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeadlineDecision {
    Noop,
    Escalate {
        reason: EscalationReason,
        suggested: Suggested,
    },
}

fn finalize_action(suggested: Suggested) -> Option<FinalizeAction> {
    match suggested {
        Suggested::Release => Some(FinalizeAction::Release),
        Suggested::Refund => Some(FinalizeAction::Refund),
        Suggested::Review => None,
    }
}

/// Evaluate the decision table in §4.7 against a freshly fetched snapshot,
/// then enqueue the escalation (dedup by identity) and notify the reviewer
/// if the final suggestion is `REVIEW`.
pub async fn process_deadline(
    job: &DeadlineJob,
    api: &dyn Api,
    policy: &dyn ChainPolicy,
    notifier: &dyn Notification,
    queue: &dyn QueueSubstrate,
    now: i64,
) -> Result<DeadlineDecision, ProcessorError> {
    let snapshot = api.get_deal_snapshot(&job.deal_id).await?;
    let elapsed = now >= job.deadline_at;

    let escalation = match job.kind {
        DeadlineKind::Delivery => {
            if matches!(
                snapshot.state,
                DealState::Delivered | DealState::Released | DealState::Refunded | DealState::Resolved
            ) || !elapsed
            {
                None
            } else {
                Some((EscalationReason::NoDelivery, Suggested::Review))
            }
        }
        DeadlineKind::Dispute => {
            if matches!(
                snapshot.state,
                DealState::Resolved | DealState::Released | DealState::Refunded
            ) || !elapsed
            {
                None
            } else if matches!(snapshot.state, DealState::Funded | DealState::Delivered) {
                Some((EscalationReason::DeadlineExpired, Suggested::Release))
            } else {
                Some((EscalationReason::DeadlineExpired, Suggested::Review))
            }
        }
    };

    let Some((reason, mut suggested)) = escalation else {
        return Ok(DeadlineDecision::Noop);
    };

    if let Some(action) = finalize_action(suggested) {
        if !policy.allows_auto_finalize(action) {
            suggested = Suggested::Review;
        }
    }

    let escalation_job = EscalationJob {
        deal_id: job.deal_id.clone(),
        reason,
        suggested,
    };
    let job_id = escalation_job_id(&escalation_job);
    queue
        .add(
            QueueName::Escalation,
            serde_json::to_value(&escalation_job).expect("EscalationJob always serializes"),
            AddOptions::new(job_id, 0),
        )
        .await?;

    if suggested == Suggested::Review {
        notifier
            .notify_reviewer(&job.deal_id, suggested, None)
            .await?;
    }

    Ok(DeadlineDecision::Escalate { reason, suggested })
}
