use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use stocky_core::domain::crosssell::{CrossSellPair, CrossSellSuggestion};
use stocky_core::domain::demand::ForecastRecord;
use stocky_core::domain::restock::{PendingAction, PendingStatus, RequestId};
use stocky_core::domain::sku::Sku;
use stocky_core::errors::ApplicationError;
use stocky_core::gate::PendingActionLedger;
use stocky_core::rank_pairs;

use super::{CrossSellRepository, ForecastRepository, RepositoryError, SkuForecastTotal};

/// In-memory ledger for tests and offline smoke runs. Mirrors the SQL
/// ledger's keyed-by-request-id append semantics.
#[derive(Default)]
pub struct InMemoryPendingActionLedger {
    rows: RwLock<HashMap<String, PendingAction>>,
}

impl InMemoryPendingActionLedger {
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl PendingActionLedger for InMemoryPendingActionLedger {
    async fn append(&self, action: PendingAction) -> Result<PendingAction, ApplicationError> {
        let mut rows = self.rows.write().await;
        Ok(rows.entry(action.request_id.0.clone()).or_insert(action).clone())
    }

    async fn find_by_request_id(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<PendingAction>, ApplicationError> {
        Ok(self.rows.read().await.get(&request_id.0).cloned())
    }

    async fn list_pending(&self, limit: u32) -> Result<Vec<PendingAction>, ApplicationError> {
        let rows = self.rows.read().await;
        let mut pending: Vec<_> =
            rows.values().filter(|row| row.status == PendingStatus::Pending).cloned().collect();
        pending.sort_by(|a, b| {
            a.created_at.cmp(&b.created_at).then_with(|| a.request_id.0.cmp(&b.request_id.0))
        });
        pending.truncate(limit as usize);
        Ok(pending)
    }
}

#[derive(Default)]
pub struct InMemoryForecastRepository {
    records: RwLock<Vec<ForecastRecord>>,
}

#[async_trait::async_trait]
impl ForecastRepository for InMemoryForecastRepository {
    async fn replace_all(&self, records: &[ForecastRecord]) -> Result<u64, RepositoryError> {
        let mut stored = self.records.write().await;
        *stored = records.to_vec();
        Ok(records.len() as u64)
    }

    async fn totals_next_days(
        &self,
        days: u32,
        limit: u32,
    ) -> Result<Vec<SkuForecastTotal>, RepositoryError> {
        let today = Utc::now().date_naive();
        let end = today + chrono::Days::new(u64::from(days));
        let records = self.records.read().await;

        let mut totals: HashMap<Sku, f64> = HashMap::new();
        for record in records.iter() {
            if record.date >= today && record.date <= end {
                *totals.entry(record.sku.clone()).or_insert(0.0) += record.predicted_demand;
            }
        }

        let mut ranked: Vec<SkuForecastTotal> = totals
            .into_iter()
            .map(|(sku, total_forecast)| SkuForecastTotal { sku, total_forecast })
            .collect();
        ranked.sort_by(|a, b| {
            b.total_forecast
                .partial_cmp(&a.total_forecast)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.sku.cmp(&b.sku))
        });
        ranked.truncate(limit as usize);
        Ok(ranked)
    }

    async fn series_for_sku(
        &self,
        sku: &Sku,
        days: u32,
    ) -> Result<Vec<ForecastRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut series: Vec<_> =
            records.iter().filter(|record| &record.sku == sku).cloned().collect();
        series.sort_by_key(|record| record.date);
        series.truncate(days as usize);
        Ok(series)
    }
}

#[derive(Default)]
pub struct InMemoryCrossSellRepository {
    pairs: RwLock<Vec<CrossSellPair>>,
}

#[async_trait::async_trait]
impl CrossSellRepository for InMemoryCrossSellRepository {
    async fn top_for_sku(
        &self,
        sku: &Sku,
        limit: u32,
    ) -> Result<Vec<CrossSellSuggestion>, RepositoryError> {
        let pairs = self.pairs.read().await;
        Ok(rank_pairs(sku, &pairs, limit as usize))
    }

    async fn replace_pairs(&self, pairs: &[CrossSellPair]) -> Result<u64, RepositoryError> {
        let mut stored = self.pairs.write().await;
        *stored = pairs.to_vec();
        Ok(pairs.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, Utc};

    use stocky_core::domain::crosssell::CrossSellPair;
    use stocky_core::domain::demand::ForecastRecord;
    use stocky_core::domain::sku::Sku;

    use super::{InMemoryCrossSellRepository, InMemoryForecastRepository};
    use crate::repositories::{CrossSellRepository, ForecastRepository};

    fn sku(value: &str) -> Sku {
        Sku(value.to_string())
    }

    #[tokio::test]
    async fn in_memory_forecast_matches_sql_ranking_semantics() {
        let repo = InMemoryForecastRepository::default();
        let tomorrow = Utc::now().date_naive() + Days::new(1);

        repo.replace_all(&[
            ForecastRecord { date: tomorrow, sku: sku("B"), predicted_demand: 5.0 },
            ForecastRecord { date: tomorrow, sku: sku("A"), predicted_demand: 5.0 },
            ForecastRecord { date: tomorrow, sku: sku("C"), predicted_demand: 9.0 },
        ])
        .await
        .expect("replace");

        let totals = repo.totals_next_days(7, 10).await.expect("totals");
        assert_eq!(totals[0].sku, sku("C"));
        // Ties break on the identifier, matching the SQL repository.
        assert_eq!(totals[1].sku, sku("A"));
        assert_eq!(totals[2].sku, sku("B"));
    }

    #[tokio::test]
    async fn in_memory_cross_sell_uses_the_shared_ranking() {
        let repo = InMemoryCrossSellRepository::default();
        repo.replace_pairs(&[CrossSellPair {
            sku_a: sku("A"),
            sku_b: sku("B"),
            pair_count: 3,
        }])
        .await
        .expect("replace");

        let suggestions = repo.top_for_sku(&sku("B"), 3).await.expect("rank");
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].sku, sku("A"));
    }
}
