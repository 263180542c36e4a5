//! For each normalized webhook event, fetch a fresh deal snapshot and hand
//! it to the scheduling engine. One event's failure is isolated and does
//! not abort the batch (§4.6).

use escrow_core::{Api, QueueSubstrate, SchedulingEngine};
use escrow_types::{NormalizedWebhookEvent, SchedulingPlan};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RouterOutcome {
    pub accepted: u32,
    pub ignored: u32,
}

pub async fn route_events<Q: QueueSubstrate>(
    events: &[NormalizedWebhookEvent],
    api: &dyn Api,
    engine: &SchedulingEngine<Q>,
    plan: &SchedulingPlan,
    now: i64,
) -> RouterOutcome {
    let mut outcome = RouterOutcome::default();

    for event in events {
        let deal_id = event.effect.deal_id();
        let snapshot = match api.get_deal_snapshot(deal_id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(deal_id, error = %err, "snapshot fetch failed, ignoring event");
                outcome.ignored += 1;
                continue;
            }
        };

        match engine.schedule(deal_id, &snapshot, &event.effect, plan, now).await {
            Ok(()) => outcome.accepted += 1,
            Err(err) => {
                tracing::warn!(deal_id, error = %err, "scheduling failed, ignoring event");
                outcome.ignored += 1;
            }
        }
    }

    outcome
}
