use serde::{Deserialize, Serialize};

/// The closed, exhaustive set of effects a provider webhook can carry.
///
/// Exhaustiveness is the point: a router that matches on this enum will
/// fail to compile if a variant is added without a corresponding case, so
/// there is no way to silently drop a new effect kind at the dispatch site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WebhookEffect {
    DealFunded { deal_id: String },
    DealDelivered { deal_id: String },
    DealDisputed { deal_id: String },
    DealReleased { deal_id: String },
    DealRefunded { deal_id: String },
}

impl WebhookEffect {
    /// The `dealId` every variant carries, regardless of kind.
    pub fn deal_id(&self) -> &str {
        match self {
            Self::DealFunded { deal_id }
            | Self::DealDelivered { deal_id }
            | Self::DealDisputed { deal_id }
            | Self::DealReleased { deal_id }
            | Self::DealRefunded { deal_id } => deal_id,
        }
    }
}

/// A provider webhook entry once intake has verified, parsed, and mapped it
/// to an internal effect. `id` is the stable identity used to suppress
/// replays; see [`crate::identity::compute_webhook_id`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedWebhookEvent {
    pub id: String,
    pub sig: String,
    pub slot: u64,
    pub when: i64,
    pub effect: WebhookEffect,
}

impl NormalizedWebhookEvent {
    pub fn new(id: String, sig: String, slot: u64, when: i64, effect: WebhookEffect) -> Self {
        Self {
            id,
            sig,
            slot,
            when,
            effect,
        }
    }
}
