use serde::{Deserialize, Serialize};
use std::fmt;

/// Which deadline a [`DeadlineJob`] is tracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineKind {
    Delivery,
    Dispute,
}

impl fmt::Display for DeadlineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Delivery => "delivery",
            Self::Dispute => "dispute",
        };
        write!(f, "{s}")
    }
}

/// Who a [`ReminderJob`] is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Buyer,
    Seller,
    Both,
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Both => "both",
        };
        write!(f, "{s}")
    }
}

/// Why a [`ReminderJob`] was scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderReason {
    DeadlineUpcoming,
    DisputeWindowClosing,
}

impl fmt::Display for ReminderReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DeadlineUpcoming => "deadline-upcoming",
            Self::DisputeWindowClosing => "dispute-window-closing",
        };
        write!(f, "{s}")
    }
}

/// Why an [`EscalationJob`] was raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EscalationReason {
    DeadlineExpired,
    NoAck,
    NoDelivery,
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DeadlineExpired => "deadline-expired",
            Self::NoAck => "no-ack",
            Self::NoDelivery => "no-delivery",
        };
        write!(f, "{s}")
    }
}

/// The action an escalation suggests, or `Review` when no automatic action
/// is safe to take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Suggested {
    Release,
    Refund,
    Review,
}

impl fmt::Display for Suggested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Release => "RELEASE",
            Self::Refund => "REFUND",
            Self::Review => "REVIEW",
        };
        write!(f, "{s}")
    }
}

/// A scheduled deadline. `nonce` lets a producer supersede a prior schedule
/// for the same `(deal_id, kind)` deterministically — see the nonce
/// protocol in the scheduling engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineJob {
    pub deal_id: String,
    pub deadline_at: i64,
    pub kind: DeadlineKind,
    pub nonce: u32,
}

/// A scheduled user-facing reminder ahead of a deadline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderJob {
    pub deal_id: String,
    pub notify_at: i64,
    pub audience: Audience,
    pub reason: ReminderReason,
}

/// An operator-facing escalation raised when a deadline elapses unresolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationJob {
    pub deal_id: String,
    pub reason: EscalationReason,
    pub suggested: Suggested,
}
