use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::sku::Sku;
use crate::errors::DomainError;

/// Dedupe key for a submitted restock. HTTP retries that carry the same id
/// resolve to the original decision instead of a second ledger row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Restock,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restock => "RESTOCK",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "RESTOCK" => Some(Self::Restock),
            _ => None,
        }
    }
}

/// Ledger row lifecycle. This subsystem only ever writes `Pending`;
/// resolution happens in an external approval process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    Pending,
    Approved,
    Rejected,
}

impl PendingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A validated restock submission. Never persisted itself; it is consumed
/// by the gate to produce a `Decision` and, above the threshold, one
/// `PendingAction` row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockRequest {
    pub request_id: RequestId,
    pub sku: Sku,
    pub amount: i64,
}

impl RestockRequest {
    pub fn parse(sku: &str, amount: i64) -> Result<Self, DomainError> {
        Self::with_request_id(RequestId::new(), sku, amount)
    }

    pub fn with_request_id(
        request_id: RequestId,
        sku: &str,
        amount: i64,
    ) -> Result<Self, DomainError> {
        let sku = Sku::parse(sku)?;
        if amount <= 0 {
            return Err(DomainError::InvalidRequest(format!(
                "restock amount must be a positive quantity, got {amount}"
            )));
        }
        Ok(Self { request_id, sku, amount })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    AutoApproved,
    PendingApproval,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoApproved => "auto_approved",
            Self::PendingApproval => "pending_approval",
        }
    }
}

/// Outcome of gating one restock request. Auto-approvals are communicated
/// synchronously and leave no ledger row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub status: DecisionStatus,
    pub sku: Sku,
    pub amount: i64,
    pub request_id: RequestId,
}

/// Durable, append-only ledger row awaiting human approval. Never mutated
/// or deleted by this subsystem after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub request_id: RequestId,
    pub action_type: ActionType,
    pub sku: Sku,
    pub amount: i64,
    pub status: PendingStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{ActionType, PendingStatus, RestockRequest};

    #[test]
    fn parse_rejects_non_positive_amounts() {
        assert!(RestockRequest::parse("SKU1", 0).is_err());
        assert!(RestockRequest::parse("SKU1", -5).is_err());
    }

    #[test]
    fn parse_rejects_blank_sku() {
        assert!(RestockRequest::parse("", 50).is_err());
    }

    #[test]
    fn parse_mints_distinct_request_ids() {
        let first = RestockRequest::parse("SKU1", 10).expect("valid");
        let second = RestockRequest::parse("SKU1", 10).expect("valid");
        assert_ne!(first.request_id, second.request_id);
    }

    #[test]
    fn status_encodings_round_trip() {
        for status in [PendingStatus::Pending, PendingStatus::Approved, PendingStatus::Rejected] {
            assert_eq!(PendingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ActionType::parse("restock"), Some(ActionType::Restock));
        assert_eq!(ActionType::parse("transfer"), None);
    }
}
