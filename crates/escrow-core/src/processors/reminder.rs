//! Decision logic for a fired [`ReminderJob`].

use escrow_types::{DealState, ReminderJob, ReminderReason};

use crate::error::ProcessorError;
use crate::ports::{Api, Notification, ReminderContext};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReminderDecision {
    Noop,
    Sent,
}

/// Suppress the reminder if the deal is already terminal, or if the
/// relevant deadline has already passed — a redelivered or stale job
/// should not chase a reminder for a window that already closed.
pub async fn process_reminder(
    job: &ReminderJob,
    api: &dyn Api,
    notifier: &dyn Notification,
    now: i64,
) -> Result<ReminderDecision, ProcessorError> {
    let snapshot = api.get_deal_snapshot(&job.deal_id).await?;

    if snapshot.is_terminal() {
        return Ok(ReminderDecision::Noop);
    }

    let stale = match job.reason {
        ReminderReason::DeadlineUpcoming => {
            snapshot.delivery_by.is_some_and(|deadline| now >= deadline)
        }
        ReminderReason::DisputeWindowClosing => snapshot
            .dispute_until
            .is_some_and(|deadline| now >= deadline),
    };
    if stale {
        return Ok(ReminderDecision::Noop);
    }

    notifier
        .send_reminder(
            &job.deal_id,
            now,
            job.audience,
            job.reason,
            ReminderContext {
                delivery_by: snapshot.delivery_by,
                dispute_until: snapshot.dispute_until,
            },
        )
        .await?;

    Ok(ReminderDecision::Sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FinalizeAction, PrepareFinalizeResult};
    use async_trait::async_trait;
    use escrow_types::{Audience, DealSnapshot, Suggested};
    use std::sync::Mutex;

    struct FakeApi(DealSnapshot);

    #[async_trait]
    impl Api for FakeApi {
        async fn get_deal_snapshot(
            &self,
            _deal_id: &str,
        ) -> Result<DealSnapshot, crate::error::PortError> {
            Ok(self.0.clone())
        }

        async fn prepare_finalize(
            &self,
            _deal_id: &str,
            _action: FinalizeAction,
        ) -> Result<PrepareFinalizeResult, crate::error::PortError> {
            unreachable!()
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        reminders_sent: Mutex<u32>,
    }

    #[async_trait]
    impl Notification for FakeNotifier {
        async fn notify_reviewer(
            &self,
            _deal_id: &str,
            _suggested: Suggested,
            _result: Option<&PrepareFinalizeResult>,
        ) -> Result<(), crate::error::PortError> {
            Ok(())
        }

        async fn notify_parties(
            &self,
            _deal_id: &str,
            _event: &str,
        ) -> Result<(), crate::error::PortError> {
            Ok(())
        }

        async fn send_reminder(
            &self,
            _deal_id: &str,
            _when: i64,
            _audience: Audience,
            _reason: ReminderReason,
            _context: ReminderContext,
        ) -> Result<(), crate::error::PortError> {
            *self.reminders_sent.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn stale_deadline_upcoming_reminder_is_suppressed() {
        let api = FakeApi(DealSnapshot::new("D-1", DealState::Funded, Some(99), None).unwrap());
        let notifier = FakeNotifier::default();
        let job = ReminderJob {
            deal_id: "D-1".into(),
            notify_at: 50,
            audience: Audience::Both,
            reason: ReminderReason::DeadlineUpcoming,
        };

        let decision = process_reminder(&job, &api, &notifier, 100).await.unwrap();
        assert_eq!(decision, ReminderDecision::Noop);
        assert_eq!(*notifier.reminders_sent.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn terminal_snapshot_suppresses_any_reminder() {
        let api = FakeApi(DealSnapshot::new("D-1", DealState::Resolved, Some(500), None).unwrap());
        let notifier = FakeNotifier::default();
        let job = ReminderJob {
            deal_id: "D-1".into(),
            notify_at: 50,
            audience: Audience::Both,
            reason: ReminderReason::DeadlineUpcoming,
        };

        let decision = process_reminder(&job, &api, &notifier, 100).await.unwrap();
        assert_eq!(decision, ReminderDecision::Noop);
    }

    #[tokio::test]
    async fn live_reminder_is_sent() {
        let api = FakeApi(DealSnapshot::new("D-1", DealState::Funded, Some(500), None).unwrap());
        let notifier = FakeNotifier::default();
        let job = ReminderJob {
            deal_id: "D-1".into(),
            notify_at: 100,
            audience: Audience::Buyer,
            reason: ReminderReason::DeadlineUpcoming,
        };

        let decision = process_reminder(&job, &api, &notifier, 100).await.unwrap();
        assert_eq!(decision, ReminderDecision::Sent);
        assert_eq!(*notifier.reminders_sent.lock().unwrap(), 1);
    }
}
