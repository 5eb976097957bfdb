//! Restock approval gate and decision ledger.
//!
//! Every restock submission is evaluated against the configured
//! auto-approval threshold. At or below the threshold the decision is
//! returned synchronously and nothing durable is written; above it exactly
//! one pending row is appended to the ledger for human resolution. The
//! ledger is append-only from this subsystem's point of view.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::restock::{
    ActionType, Decision, DecisionStatus, PendingAction, PendingStatus, RequestId, RestockRequest,
};
use crate::errors::ApplicationError;

/// Durable store for pending actions. Implementations must make `append`
/// all-or-nothing per call and key rows by request id so a retried append
/// cannot create a second row.
#[async_trait]
pub trait PendingActionLedger: Send + Sync {
    /// Appends one pending row. When a row with the same request id already
    /// exists, implementations return that row unchanged.
    async fn append(&self, action: PendingAction) -> Result<PendingAction, ApplicationError>;

    async fn find_by_request_id(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<PendingAction>, ApplicationError>;

    async fn list_pending(&self, limit: u32) -> Result<Vec<PendingAction>, ApplicationError>;
}

/// Threshold policy. A pure function of the request's own amount; concurrent
/// submissions need no cross-request coordination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GatePolicy {
    auto_approval_threshold: i64,
}

impl GatePolicy {
    pub fn new(auto_approval_threshold: i64) -> Self {
        Self { auto_approval_threshold: auto_approval_threshold.max(1) }
    }

    pub fn threshold(&self) -> i64 {
        self.auto_approval_threshold
    }

    pub fn requires_approval(&self, amount: i64) -> bool {
        amount > self.auto_approval_threshold
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::new(100)
    }
}

pub struct RestockGate {
    policy: GatePolicy,
    ledger: Arc<dyn PendingActionLedger>,
    audit: Arc<dyn AuditSink>,
}

impl RestockGate {
    pub fn new(
        policy: GatePolicy,
        ledger: Arc<dyn PendingActionLedger>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { policy, ledger, audit }
    }

    pub fn policy(&self) -> GatePolicy {
        self.policy
    }

    /// Gates one restock request. Input validation happens in
    /// `RestockRequest::parse` before any side effect; a ledger failure is
    /// surfaced verbatim and never retried here (retry policy belongs to
    /// the caller, keyed by the request id).
    pub async fn submit(&self, request: RestockRequest) -> Result<Decision, ApplicationError> {
        // A replayed request id resolves to the original decision so HTTP
        // retries cannot produce duplicate pending rows.
        if let Some(existing) = self.ledger.find_by_request_id(&request.request_id).await? {
            info!(
                event_name = "gate.replayed_request",
                correlation_id = %request.request_id.0,
                sku = %existing.sku,
                "restock submission replayed, returning original decision"
            );
            return Ok(Decision {
                status: DecisionStatus::PendingApproval,
                sku: existing.sku,
                amount: existing.amount,
                request_id: existing.request_id,
            });
        }

        if !self.policy.requires_approval(request.amount) {
            // Deliberately no durable record on this path; the audit stream
            // is the only trace of an auto-approval.
            self.audit.emit(
                AuditEvent::new(
                    Some(request.sku.clone()),
                    request.request_id.0.clone(),
                    "gate.auto_approved",
                    AuditCategory::Gate,
                    "restock-gate",
                    AuditOutcome::Success,
                )
                .with_metadata("amount", request.amount.to_string())
                .with_metadata("threshold", self.policy.threshold().to_string()),
            );
            return Ok(Decision {
                status: DecisionStatus::AutoApproved,
                sku: request.sku,
                amount: request.amount,
                request_id: request.request_id,
            });
        }

        let action = PendingAction {
            request_id: request.request_id.clone(),
            action_type: ActionType::Restock,
            sku: request.sku.clone(),
            amount: request.amount,
            status: PendingStatus::Pending,
            created_at: chrono::Utc::now(),
        };

        let persisted = match self.ledger.append(action).await {
            Ok(persisted) => persisted,
            Err(error) => {
                self.audit.emit(
                    AuditEvent::new(
                        Some(request.sku.clone()),
                        request.request_id.0.clone(),
                        "gate.ledger_write_failed",
                        AuditCategory::Persistence,
                        "restock-gate",
                        AuditOutcome::Failed,
                    )
                    .with_metadata("amount", request.amount.to_string()),
                );
                return Err(error);
            }
        };

        self.audit.emit(
            AuditEvent::new(
                Some(persisted.sku.clone()),
                persisted.request_id.0.clone(),
                "gate.pending_approval",
                AuditCategory::Gate,
                "restock-gate",
                AuditOutcome::Success,
            )
            .with_metadata("amount", persisted.amount.to_string())
            .with_metadata("threshold", self.policy.threshold().to_string()),
        );

        Ok(Decision {
            status: DecisionStatus::PendingApproval,
            sku: persisted.sku,
            amount: persisted.amount,
            request_id: persisted.request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use super::{GatePolicy, PendingActionLedger, RestockGate};
    use crate::audit::InMemoryAuditSink;
    use crate::domain::restock::{
        DecisionStatus, PendingAction, PendingStatus, RequestId, RestockRequest,
    };
    use crate::errors::ApplicationError;

    #[derive(Default)]
    struct InMemoryLedger {
        rows: RwLock<HashMap<String, PendingAction>>,
        fail_writes: bool,
    }

    impl InMemoryLedger {
        fn failing() -> Self {
            Self { fail_writes: true, ..Self::default() }
        }

        async fn row_count(&self) -> usize {
            self.rows.read().await.len()
        }
    }

    #[async_trait::async_trait]
    impl PendingActionLedger for InMemoryLedger {
        async fn append(
            &self,
            action: PendingAction,
        ) -> Result<PendingAction, ApplicationError> {
            if self.fail_writes {
                return Err(ApplicationError::LedgerWrite("insert rejected".to_string()));
            }
            let mut rows = self.rows.write().await;
            Ok(rows.entry(action.request_id.0.clone()).or_insert(action).clone())
        }

        async fn find_by_request_id(
            &self,
            request_id: &RequestId,
        ) -> Result<Option<PendingAction>, ApplicationError> {
            Ok(self.rows.read().await.get(&request_id.0).cloned())
        }

        async fn list_pending(
            &self,
            limit: u32,
        ) -> Result<Vec<PendingAction>, ApplicationError> {
            let rows = self.rows.read().await;
            let mut pending: Vec<_> =
                rows.values().filter(|row| row.status == PendingStatus::Pending).cloned().collect();
            pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            pending.truncate(limit as usize);
            Ok(pending)
        }
    }

    fn gate_over(ledger: Arc<InMemoryLedger>) -> (RestockGate, InMemoryAuditSink) {
        let audit = InMemoryAuditSink::default();
        let gate = RestockGate::new(GatePolicy::new(100), ledger, Arc::new(audit.clone()));
        (gate, audit)
    }

    #[tokio::test]
    async fn amounts_at_or_below_threshold_auto_approve_with_zero_ledger_rows() {
        let ledger = Arc::new(InMemoryLedger::default());
        let (gate, audit) = gate_over(ledger.clone());

        for amount in [1, 50, 100] {
            let decision = gate
                .submit(RestockRequest::parse("SKU1", amount).expect("valid"))
                .await
                .expect("submit");
            assert_eq!(decision.status, DecisionStatus::AutoApproved);
            assert_eq!(decision.amount, amount);
        }

        assert_eq!(ledger.row_count().await, 0);
        assert_eq!(audit.events().len(), 3);
        assert!(audit.events().iter().all(|event| event.event_type == "gate.auto_approved"));
    }

    #[tokio::test]
    async fn amounts_above_threshold_append_exactly_one_pending_row() {
        let ledger = Arc::new(InMemoryLedger::default());
        let (gate, _audit) = gate_over(ledger.clone());

        let decision = gate
            .submit(RestockRequest::parse("SKU1", 101).expect("valid"))
            .await
            .expect("submit");

        assert_eq!(decision.status, DecisionStatus::PendingApproval);
        assert_eq!(ledger.row_count().await, 1);

        let pending = ledger.list_pending(10).await.expect("list");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].sku.as_str(), "SKU1");
        assert_eq!(pending[0].amount, 101);
        assert_eq!(pending[0].status, PendingStatus::Pending);
    }

    #[tokio::test]
    async fn malformed_submissions_fail_without_side_effects() {
        let ledger = Arc::new(InMemoryLedger::default());
        let (_gate, audit) = gate_over(ledger.clone());

        assert!(RestockRequest::parse("", 50).is_err());
        assert!(RestockRequest::parse("SKU1", 0).is_err());

        assert_eq!(ledger.row_count().await, 0);
        assert!(audit.events().is_empty());
    }

    #[tokio::test]
    async fn replayed_request_id_returns_original_decision_without_second_row() {
        let ledger = Arc::new(InMemoryLedger::default());
        let (gate, _audit) = gate_over(ledger.clone());

        let request = RestockRequest::parse("SKU9", 500).expect("valid");
        let first = gate.submit(request.clone()).await.expect("first submit");
        let replay = gate.submit(request).await.expect("replayed submit");

        assert_eq!(first, replay);
        assert_eq!(ledger.row_count().await, 1);
    }

    #[tokio::test]
    async fn ledger_failure_is_surfaced_verbatim_and_not_retried() {
        let ledger = Arc::new(InMemoryLedger::failing());
        let (gate, audit) = gate_over(ledger.clone());

        let error = gate
            .submit(RestockRequest::parse("SKU1", 250).expect("valid"))
            .await
            .expect_err("ledger write should fail");

        assert!(matches!(error, ApplicationError::LedgerWrite(_)));
        assert_eq!(ledger.row_count().await, 0);
        assert!(audit
            .events()
            .iter()
            .any(|event| event.event_type == "gate.ledger_write_failed"));
    }

    #[tokio::test]
    async fn concurrent_submissions_near_threshold_evaluate_independently() {
        let ledger = Arc::new(InMemoryLedger::default());
        let (gate, _audit) = gate_over(ledger.clone());
        let gate = Arc::new(gate);

        let below = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.submit(RestockRequest::parse("SKU-A", 100).expect("valid")).await
            })
        };
        let above = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.submit(RestockRequest::parse("SKU-A", 101).expect("valid")).await
            })
        };

        let below = below.await.expect("join").expect("submit");
        let above = above.await.expect("join").expect("submit");

        assert_eq!(below.status, DecisionStatus::AutoApproved);
        assert_eq!(above.status, DecisionStatus::PendingApproval);
        assert_eq!(ledger.row_count().await, 1);
    }
}
