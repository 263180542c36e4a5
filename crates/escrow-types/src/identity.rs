//! Deterministic identity construction for every job kind and for webhook
//! events.
//!
//! Every function here is pure: same input, same output, forever. That
//! stability is the whole point — it is what lets two independent producers
//! converge on one pending job, and what lets the queue substrate dedupe a
//! redelivered webhook. Any change to the composition of these strings is a
//! breaking change for every deployment with jobs in flight.

use sha2::{Digest, Sha256};

use crate::jobs::{DeadlineJob, EscalationJob, ReminderJob};

/// Identity for a [`DeadlineJob`]: `deadline:<dealId>:<deadlineAt>:<kind>:<nonce>`.
pub fn deadline_job_id(job: &DeadlineJob) -> String {
    format!(
        "deadline:{}:{}:{}:{}",
        job.deal_id, job.deadline_at, job.kind, job.nonce
    )
}

/// Identity for a [`ReminderJob`]: `reminder:<dealId>:<notifyAt>:<audience>:<reason>`.
pub fn reminder_job_id(job: &ReminderJob) -> String {
    format!(
        "reminder:{}:{}:{}:{}",
        job.deal_id, job.notify_at, job.audience, job.reason
    )
}

/// Identity for an [`EscalationJob`]: `escalation:<dealId>:<reason>:<suggested>`.
pub fn escalation_job_id(job: &EscalationJob) -> String {
    format!(
        "escalation:{}:{}:{}",
        job.deal_id, job.reason, job.suggested
    )
}

/// Compute the stable id for a normalized webhook event.
///
/// `SHA-256(webhookId || "|" || sig || "|" || index)`, hex-encoded. Missing
/// parts default to empty string (`webhookId`, `sig`) and `0` (`index`), so
/// that the function is total over whatever intake can extract from a
/// loosely-typed provider payload.
pub fn compute_webhook_id(webhook_id: Option<&str>, sig: Option<&str>, index: Option<u64>) -> String {
    let webhook_id = webhook_id.unwrap_or("");
    let sig = sig.unwrap_or("");
    let index = index.unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(webhook_id.as_bytes());
    hasher.update(b"|");
    hasher.update(sig.as_bytes());
    hasher.update(b"|");
    hasher.update(index.to_string().as_bytes());

    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{
        Audience, DeadlineKind, EscalationReason, ReminderReason, Suggested,
    };

    #[test]
    fn deadline_id_is_stable_for_structurally_equal_inputs() {
        let a = DeadlineJob {
            deal_id: "D-1".into(),
            deadline_at: 1000,
            kind: DeadlineKind::Delivery,
            nonce: 0,
        };
        let b = a.clone();
        assert_eq!(deadline_job_id(&a), deadline_job_id(&b));
        assert_eq!(deadline_job_id(&a), "deadline:D-1:1000:delivery:0");
    }

    #[test]
    fn deadline_id_changes_with_any_field() {
        let base = DeadlineJob {
            deal_id: "D-1".into(),
            deadline_at: 1000,
            kind: DeadlineKind::Delivery,
            nonce: 0,
        };

        let mut other = base.clone();
        other.nonce = 1;
        assert_ne!(deadline_job_id(&base), deadline_job_id(&other));

        let mut other = base.clone();
        other.kind = DeadlineKind::Dispute;
        assert_ne!(deadline_job_id(&base), deadline_job_id(&other));

        let mut other = base.clone();
        other.deadline_at = 1001;
        assert_ne!(deadline_job_id(&base), deadline_job_id(&other));

        let mut other = base.clone();
        other.deal_id = "D-2".into();
        assert_ne!(deadline_job_id(&base), deadline_job_id(&other));
    }

    #[test]
    fn reminder_id_matches_expected_format() {
        let job = ReminderJob {
            deal_id: "D-42".into(),
            notify_at: 500,
            audience: Audience::Both,
            reason: ReminderReason::DeadlineUpcoming,
        };
        assert_eq!(
            reminder_job_id(&job),
            "reminder:D-42:500:both:deadline-upcoming"
        );
    }

    #[test]
    fn escalation_id_matches_expected_format() {
        let job = EscalationJob {
            deal_id: "D-123".into(),
            reason: EscalationReason::NoDelivery,
            suggested: Suggested::Review,
        };
        assert_eq!(escalation_job_id(&job), "escalation:D-123:no-delivery:REVIEW");
    }

    #[test]
    fn webhook_id_is_deterministic_and_sensitive_to_every_part() {
        let a = compute_webhook_id(Some("wh-1"), Some("sig-1"), Some(3));
        let b = compute_webhook_id(Some("wh-1"), Some("sig-1"), Some(3));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let diff_index = compute_webhook_id(Some("wh-1"), Some("sig-1"), Some(4));
        assert_ne!(a, diff_index);

        let diff_sig = compute_webhook_id(Some("wh-1"), Some("sig-2"), Some(3));
        assert_ne!(a, diff_sig);

        let diff_webhook = compute_webhook_id(Some("wh-2"), Some("sig-1"), Some(3));
        assert_ne!(a, diff_webhook);
    }

    #[test]
    fn webhook_id_defaults_missing_parts() {
        let with_defaults = compute_webhook_id(None, None, None);
        let explicit = compute_webhook_id(Some(""), Some(""), Some(0));
        assert_eq!(with_defaults, explicit);
    }
}
