use stocky_core::domain::pricing::PriceRecommendation;

use super::{PriceRecommendationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPriceRecommendationRepository {
    pool: DbPool,
}

impl SqlPriceRecommendationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PriceRecommendationRepository for SqlPriceRecommendationRepository {
    async fn append_run(&self, rows: &[PriceRecommendation]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                "INSERT INTO price_recommendation (product_id, recommended_price, confidence_score, last_updated, reason)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&row.product_id.0)
            .bind(row.recommended_price.to_string())
            .bind(row.confidence_score.to_string())
            .bind(row.last_updated.to_rfc3339())
            .bind(&row.reason)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(rows.len() as u64)
    }
}
