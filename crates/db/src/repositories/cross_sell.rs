use sqlx::Row;

use stocky_core::domain::crosssell::{CrossSellPair, CrossSellSuggestion};
use stocky_core::domain::sku::Sku;

use super::{CrossSellRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCrossSellRepository {
    pool: DbPool,
}

impl SqlCrossSellRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CrossSellRepository for SqlCrossSellRepository {
    async fn top_for_sku(
        &self,
        sku: &Sku,
        limit: u32,
    ) -> Result<Vec<CrossSellSuggestion>, RepositoryError> {
        // Pairs are undirected; match either slot and suggest the other.
        // Ties break on the suggested identifier so ranking is stable for a
        // given snapshot.
        let rows = sqlx::query(
            "SELECT suggested_sku, SUM(pair_count) AS pair_count FROM (
                 SELECT CASE WHEN sku_a = ? THEN sku_b ELSE sku_a END AS suggested_sku, pair_count
                 FROM cross_sell_pairs
                 WHERE sku_a = ? OR sku_b = ?
             )
             GROUP BY suggested_sku
             ORDER BY pair_count DESC, suggested_sku ASC
             LIMIT ?",
        )
        .bind(sku.as_str())
        .bind(sku.as_str())
        .bind(sku.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let suggested: String = row
                    .try_get("suggested_sku")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let pair_count: i64 =
                    row.try_get("pair_count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(CrossSellSuggestion { sku: Sku(suggested), pair_count })
            })
            .collect()
    }

    async fn replace_pairs(&self, pairs: &[CrossSellPair]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cross_sell_pairs").execute(&mut *tx).await?;
        for pair in pairs {
            sqlx::query(
                "INSERT INTO cross_sell_pairs (sku_a, sku_b, pair_count) VALUES (?, ?, ?)
                 ON CONFLICT(sku_a, sku_b) DO UPDATE SET pair_count = pair_count + excluded.pair_count",
            )
            .bind(pair.sku_a.as_str())
            .bind(pair.sku_b.as_str())
            .bind(pair.pair_count)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(pairs.len() as u64)
    }
}
