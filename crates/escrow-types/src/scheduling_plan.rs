use serde::{Deserialize, Serialize};

/// Policy-derived configuration for the scheduling engine.
///
/// The default value reproduces the event-derived minimalist schedule: one
/// reminder 24h ahead of a delivery deadline, one reminder 2h ahead of a
/// dispute deadline, no separate escalation timer (the deadline jobs
/// themselves drive escalation when they fire). Passing a richer plan
/// enumerates additional reminder offsets or a standalone escalation timer
/// without changing which engine code runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingPlan {
    /// Minutes before a delivery deadline at which to remind, most distant first.
    pub delivery_reminder_offsets_minutes: Vec<i64>,
    /// Minutes before a dispute deadline at which to remind, most distant first.
    pub dispute_reminder_offsets_minutes: Vec<i64>,
    /// When set, also schedule a standalone escalation this many minutes
    /// after the dispute deadline elapses, independent of the deadline job.
    pub escalation_after_dispute_minutes: Option<i64>,
}

impl Default for SchedulingPlan {
    fn default() -> Self {
        Self {
            delivery_reminder_offsets_minutes: vec![24 * 60],
            dispute_reminder_offsets_minutes: vec![2 * 60],
            escalation_after_dispute_minutes: None,
        }
    }
}
