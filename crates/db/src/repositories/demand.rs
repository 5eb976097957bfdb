use chrono::NaiveDate;
use sqlx::Row;

use stocky_core::domain::demand::DemandObservation;
use stocky_core::domain::sku::Sku;

use super::{DemandRepository, RepositoryError};
use crate::DbPool;

pub struct SqlDemandRepository {
    pool: DbPool,
}

impl SqlDemandRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|error| RepositoryError::Decode(format!("bad date `{value}`: {error}")))
}

#[async_trait::async_trait]
impl DemandRepository for SqlDemandRepository {
    async fn load_history(&self) -> Result<Vec<DemandObservation>, RepositoryError> {
        let rows = sqlx::query("SELECT date, sku, picks FROM daily_demand ORDER BY sku, date")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let date: String =
                    row.try_get("date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let sku: String =
                    row.try_get("sku").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let picks: i64 =
                    row.try_get("picks").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(DemandObservation { date: parse_date(&date)?, sku: Sku(sku), picks })
            })
            .collect()
    }

    async fn insert_observations(
        &self,
        observations: &[DemandObservation],
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for observation in observations {
            let result = sqlx::query(
                "INSERT INTO daily_demand (date, sku, picks) VALUES (?, ?, ?)
                 ON CONFLICT(date, sku) DO NOTHING",
            )
            .bind(observation.date.format("%Y-%m-%d").to_string())
            .bind(observation.sku.as_str())
            .bind(observation.picks)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }
}
