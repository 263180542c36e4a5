//! External collaborators expressed as traits, so production adapters and
//! test fakes implement the same interface. Implementations are resolved
//! once per worker process and MUST tolerate being constructed without
//! side effects until their first method call.

use async_trait::async_trait;
use escrow_types::DealSnapshot;

use crate::error::PortError;

/// Result of asking the chain-facing API to stage a finalize action.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PrepareFinalizeResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blink_url: Option<String>,
}

/// An action the escalation processor may ask the API port to prepare.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalizeAction {
    Release,
    Refund,
}

impl std::fmt::Display for FinalizeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Release => "RELEASE",
            Self::Refund => "REFUND",
        };
        write!(f, "{s}")
    }
}

/// The deal's source of truth. Every call fetches fresh state; nothing is
/// cached across jobs.
#[async_trait]
pub trait Api: Send + Sync {
    async fn get_deal_snapshot(&self, deal_id: &str) -> Result<DealSnapshot, PortError>;

    /// Idempotent per `(deal_id, action)`.
    async fn prepare_finalize(
        &self,
        deal_id: &str,
        action: FinalizeAction,
    ) -> Result<PrepareFinalizeResult, PortError>;
}

/// Context handed to `sendReminder` alongside the core fields.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReminderContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispute_until: Option<i64>,
}

/// Outbound user- and operator-facing notifications. Every method MUST be
/// idempotent: the substrate's at-least-once delivery means a processor may
/// run twice for the same job identity, and the notifier is the second
/// layer (alongside dedup-by-identity) that keeps the user-visible effect
/// to exactly one.
#[async_trait]
pub trait Notification: Send + Sync {
    async fn notify_reviewer(
        &self,
        deal_id: &str,
        suggested: escrow_types::Suggested,
        result: Option<&PrepareFinalizeResult>,
    ) -> Result<(), PortError>;

    async fn notify_parties(&self, deal_id: &str, event: &str) -> Result<(), PortError>;

    async fn send_reminder(
        &self,
        deal_id: &str,
        when: i64,
        audience: escrow_types::Audience,
        reason: escrow_types::ReminderReason,
        context: ReminderContext,
    ) -> Result<(), PortError>;
}

/// Read-only capability check gating auto-finalize. Strict-default: both
/// actions are disallowed unless the implementation is explicitly
/// configured to allow them. Side-effect-free.
pub trait ChainPolicy: Send + Sync {
    fn allows_auto_finalize(&self, action: FinalizeAction) -> bool;
}
