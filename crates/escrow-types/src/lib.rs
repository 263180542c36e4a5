pub mod deal;
pub mod error;
pub mod identity;
pub mod jobs;
pub mod scheduling_plan;
pub mod webhook_event;

pub use deal::{DealSnapshot, DealState};
pub use error::DomainError;
pub use identity::{compute_webhook_id, deadline_job_id, escalation_job_id, reminder_job_id};
pub use jobs::{
    Audience, DeadlineJob, DeadlineKind, EscalationJob, EscalationReason, ReminderJob,
    ReminderReason, Suggested,
};
pub use scheduling_plan::SchedulingPlan;
pub use webhook_event::{NormalizedWebhookEvent, WebhookEffect};
