use chrono::{DateTime, Utc};
use sqlx::Row;

use stocky_core::domain::restock::{ActionType, PendingAction, PendingStatus, RequestId};
use stocky_core::domain::sku::Sku;
use stocky_core::errors::ApplicationError;
use stocky_core::gate::PendingActionLedger;

use crate::DbPool;

/// Append-only pending-action ledger backed by the `pending_actions` table.
/// `request_id` is the primary key, so a retried append resolves to the
/// original row instead of inserting a duplicate.
pub struct SqlPendingActionLedger {
    pool: DbPool,
}

impl SqlPendingActionLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_action(row: &sqlx::sqlite::SqliteRow) -> Result<PendingAction, ApplicationError> {
    let request_id: String =
        row.try_get("request_id").map_err(|e| ApplicationError::UpstreamQuery(e.to_string()))?;
    let action_type: String =
        row.try_get("action_type").map_err(|e| ApplicationError::UpstreamQuery(e.to_string()))?;
    let sku: String =
        row.try_get("sku").map_err(|e| ApplicationError::UpstreamQuery(e.to_string()))?;
    let amount: i64 =
        row.try_get("amount").map_err(|e| ApplicationError::UpstreamQuery(e.to_string()))?;
    let status: String =
        row.try_get("status").map_err(|e| ApplicationError::UpstreamQuery(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| ApplicationError::UpstreamQuery(e.to_string()))?;

    Ok(PendingAction {
        request_id: RequestId(request_id),
        action_type: ActionType::parse(&action_type).unwrap_or(ActionType::Restock),
        sku: Sku(sku),
        amount,
        status: PendingStatus::parse(&status).unwrap_or(PendingStatus::Pending),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[async_trait::async_trait]
impl PendingActionLedger for SqlPendingActionLedger {
    async fn append(&self, action: PendingAction) -> Result<PendingAction, ApplicationError> {
        // Single-statement insert: either the row fully persists or the
        // caller sees the error. A concurrent duplicate loses the insert
        // race and falls through to the read below.
        sqlx::query(
            "INSERT INTO pending_actions (request_id, action_type, sku, amount, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(request_id) DO NOTHING",
        )
        .bind(&action.request_id.0)
        .bind(action.action_type.as_str())
        .bind(action.sku.as_str())
        .bind(action.amount)
        .bind(action.status.as_str())
        .bind(action.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|error| ApplicationError::LedgerWrite(error.to_string()))?;

        self.find_by_request_id(&action.request_id).await?.ok_or_else(|| {
            ApplicationError::LedgerWrite(format!(
                "pending action `{}` vanished after insert",
                action.request_id.0
            ))
        })
    }

    async fn find_by_request_id(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<PendingAction>, ApplicationError> {
        let row = sqlx::query(
            "SELECT request_id, action_type, sku, amount, status, created_at
             FROM pending_actions WHERE request_id = ?",
        )
        .bind(&request_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| ApplicationError::UpstreamQuery(error.to_string()))?;

        match row {
            Some(ref row) => Ok(Some(row_to_action(row)?)),
            None => Ok(None),
        }
    }

    async fn list_pending(&self, limit: u32) -> Result<Vec<PendingAction>, ApplicationError> {
        let rows = sqlx::query(
            "SELECT request_id, action_type, sku, amount, status, created_at
             FROM pending_actions
             WHERE status = 'pending'
             ORDER BY created_at ASC, request_id ASC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| ApplicationError::UpstreamQuery(error.to_string()))?;

        rows.iter().map(row_to_action).collect()
    }
}
