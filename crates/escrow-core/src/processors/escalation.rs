//! Decision logic for a fired [`EscalationJob`]. Never submits a
//! transaction and never holds a key: the furthest this goes is asking the
//! API port to stage a finalize action for a human to approve.

use escrow_types::{EscalationJob, Suggested};

use crate::error::ProcessorError;
use crate::ports::{Api, ChainPolicy, FinalizeAction, Notification, PrepareFinalizeResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EscalationDecision {
    Prepared(PrepareFinalizeResult),
    Review,
}

pub async fn process_escalation(
    job: &EscalationJob,
    api: &dyn Api,
    policy: &dyn ChainPolicy,
    notifier: &dyn Notification,
) -> Result<EscalationDecision, ProcessorError> {
    let action = match job.suggested {
        Suggested::Release => Some(FinalizeAction::Release),
        Suggested::Refund => Some(FinalizeAction::Refund),
        Suggested::Review => None,
    };

    if let Some(action) = action {
        if policy.allows_auto_finalize(action) {
            match api.prepare_finalize(&job.deal_id, action).await {
                Ok(result) => {
                    notifier
                        .notify_reviewer(&job.deal_id, job.suggested, Some(&result))
                        .await?;
                    notifier
                        .notify_parties(&job.deal_id, "finalize-prepared")
                        .await?;
                    return Ok(EscalationDecision::Prepared(result));
                }
                Err(_) => {
                    notifier
                        .notify_reviewer(&job.deal_id, Suggested::Review, None)
                        .await?;
                    return Ok(EscalationDecision::Review);
                }
            }
        }
    }

    notifier
        .notify_reviewer(&job.deal_id, Suggested::Review, None)
        .await?;
    Ok(EscalationDecision::Review)
}
