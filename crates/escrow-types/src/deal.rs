use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle state of an escrow deal.
///
/// `Resolved`, `Released`, and `Refunded` are terminal: once a deal reaches
/// one of them, every scheduled timer for that deal MUST be cancelled and no
/// processor is allowed to act on it again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DealState {
    Init,
    Funded,
    Delivered,
    Disputed,
    Resolved,
    Released,
    Refunded,
}

impl DealState {
    /// Terminal states suppress all scheduled work for the deal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Released | Self::Refunded)
    }
}

impl std::fmt::Display for DealState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Init => "INIT",
            Self::Funded => "FUNDED",
            Self::Delivered => "DELIVERED",
            Self::Disputed => "DISPUTED",
            Self::Resolved => "RESOLVED",
            Self::Released => "RELEASED",
            Self::Refunded => "REFUNDED",
        };
        write!(f, "{s}")
    }
}

/// Read-only view of a deal's current state, fetched fresh from the API port
/// by every caller that needs it. Never cached across jobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealSnapshot {
    pub id: String,
    pub state: DealState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispute_until: Option<i64>,
}

impl DealSnapshot {
    /// Construct a snapshot, validating the invariants from the data model:
    /// timestamps are positive integers in seconds when present.
    pub fn new(
        id: impl Into<String>,
        state: DealState,
        delivery_by: Option<i64>,
        dispute_until: Option<i64>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyDealId);
        }
        if let Some(value) = delivery_by {
            if value <= 0 {
                return Err(DomainError::NonPositiveTimestamp {
                    field: "deliveryBy",
                    value,
                });
            }
        }
        if let Some(value) = dispute_until {
            if value <= 0 {
                return Err(DomainError::NonPositiveTimestamp {
                    field: "disputeUntil",
                    value,
                });
            }
        }
        Ok(Self {
            id,
            state,
            delivery_by,
            dispute_until,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_exactly_resolved_released_refunded() {
        let terminal = [DealState::Resolved, DealState::Released, DealState::Refunded];
        let non_terminal = [
            DealState::Init,
            DealState::Funded,
            DealState::Delivered,
            DealState::Disputed,
        ];
        for s in terminal {
            assert!(s.is_terminal());
        }
        for s in non_terminal {
            assert!(!s.is_terminal());
        }
    }

    #[test]
    fn rejects_empty_deal_id() {
        let err = DealSnapshot::new("", DealState::Init, None, None).unwrap_err();
        assert_eq!(err, DomainError::EmptyDealId);
    }

    #[test]
    fn rejects_non_positive_timestamps() {
        let err = DealSnapshot::new("D-1", DealState::Funded, Some(0), None).unwrap_err();
        assert_eq!(
            err,
            DomainError::NonPositiveTimestamp {
                field: "deliveryBy",
                value: 0,
            }
        );
    }

    #[test]
    fn accepts_valid_snapshot() {
        let snap = DealSnapshot::new("D-1", DealState::Funded, Some(100), None).unwrap();
        assert_eq!(snap.id, "D-1");
        assert!(!snap.is_terminal());
    }
}
