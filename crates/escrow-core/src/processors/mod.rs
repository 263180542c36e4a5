pub mod deadline;
pub mod escalation;
pub mod reminder;

pub use deadline::{DeadlineDecision, process_deadline};
pub use escalation::{EscalationDecision, process_escalation};
pub use reminder::{ReminderDecision, process_reminder};
