pub mod engine;
pub mod error;
pub mod policy;
pub mod ports;
pub mod processors;
pub mod queue;

pub use engine::SchedulingEngine;
pub use error::{PortError, ProcessorError};
pub use policy::PolicyGate;
pub use ports::{Api, ChainPolicy, FinalizeAction, Notification, PrepareFinalizeResult, ReminderContext};
pub use processors::{
    DeadlineDecision, EscalationDecision, ReminderDecision, process_deadline, process_escalation,
    process_reminder,
};
pub use queue::{AddOptions, InMemoryQueue, QueueError, QueueName, QueueSubstrate};
