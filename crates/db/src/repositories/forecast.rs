use sqlx::Row;

use stocky_core::domain::demand::ForecastRecord;
use stocky_core::domain::sku::Sku;
use stocky_core::schema::{resolve_column, FORECAST_VALUE_COLUMNS};

use super::demand::parse_date;
use super::{ForecastRepository, RepositoryError, SkuForecastTotal};
use crate::DbPool;

const TABLE: &str = "demand_forecast";

pub struct SqlForecastRepository {
    pool: DbPool,
}

impl SqlForecastRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Resolves which forecast value column this table actually carries.
    /// Loader versions have drifted between `predicted_demand` and `yhat`;
    /// reading the wrong column silently would be worse than failing.
    pub async fn value_column(&self) -> Result<&'static str, RepositoryError> {
        let sql = format!("SELECT name FROM pragma_table_info('{TABLE}')");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let available: Vec<String> = rows
            .iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<Result<_, _>>()
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        resolve_column(&available, &FORECAST_VALUE_COLUMNS)
            .ok_or(RepositoryError::SchemaMismatch { table: TABLE.to_string(), available })
    }
}

#[async_trait::async_trait]
impl ForecastRepository for SqlForecastRepository {
    async fn replace_all(&self, records: &[ForecastRecord]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM demand_forecast").execute(&mut *tx).await?;
        for record in records {
            sqlx::query("INSERT INTO demand_forecast (date, sku, predicted_demand) VALUES (?, ?, ?)")
                .bind(record.date.format("%Y-%m-%d").to_string())
                .bind(record.sku.as_str())
                .bind(record.predicted_demand)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(records.len() as u64)
    }

    async fn totals_next_days(
        &self,
        days: u32,
        limit: u32,
    ) -> Result<Vec<SkuForecastTotal>, RepositoryError> {
        let column = self.value_column().await?;
        // The column name comes from the trusted candidate list, never from
        // caller input; sku and range bounds are always bound parameters.
        let sql = format!(
            "SELECT sku, SUM(\"{column}\") AS total_forecast
             FROM demand_forecast
             WHERE date >= date('now') AND date <= date('now', ?)
             GROUP BY sku
             ORDER BY total_forecast DESC, sku ASC
             LIMIT ?"
        );

        let rows = sqlx::query(&sql)
            .bind(format!("+{days} day"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let sku: String =
                    row.try_get("sku").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let total_forecast: f64 = row
                    .try_get("total_forecast")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(SkuForecastTotal { sku: Sku(sku), total_forecast })
            })
            .collect()
    }

    async fn series_for_sku(
        &self,
        sku: &Sku,
        days: u32,
    ) -> Result<Vec<ForecastRecord>, RepositoryError> {
        let column = self.value_column().await?;
        let sql = format!(
            "SELECT date, \"{column}\" AS forecast_value
             FROM demand_forecast
             WHERE sku = ?
             ORDER BY date
             LIMIT ?"
        );

        let rows = sqlx::query(&sql).bind(sku.as_str()).bind(days).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                let date: String =
                    row.try_get("date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let forecast_value: f64 = row
                    .try_get("forecast_value")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(ForecastRecord {
                    date: parse_date(&date)?,
                    sku: sku.clone(),
                    predicted_demand: forecast_value,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate, Utc};

    use stocky_core::domain::demand::ForecastRecord;
    use stocky_core::domain::sku::Sku;

    use super::SqlForecastRepository;
    use crate::repositories::{ForecastRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn record(sku: &str, date: NaiveDate, value: f64) -> ForecastRecord {
        ForecastRecord { date, sku: Sku(sku.to_string()), predicted_demand: value }
    }

    fn upcoming(offset: u64) -> NaiveDate {
        Utc::now().date_naive().checked_add_days(Days::new(offset)).expect("valid date")
    }

    #[tokio::test]
    async fn replace_all_discards_the_previous_run() {
        let pool = setup().await;
        let repo = SqlForecastRepository::new(pool);

        repo.replace_all(&[
            record("SKU1", upcoming(1), 10.0),
            record("SKU1", upcoming(2), 11.0),
        ])
        .await
        .expect("first refresh");

        repo.replace_all(&[record("SKU1", upcoming(1), 99.0)]).await.expect("second refresh");

        let series = repo.series_for_sku(&Sku("SKU1".to_string()), 7).await.expect("series");
        assert_eq!(series.len(), 1, "only the second run's rows should remain");
        assert!((series[0].predicted_demand - 99.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn totals_rank_skus_over_the_next_window() {
        let pool = setup().await;
        let repo = SqlForecastRepository::new(pool);

        repo.replace_all(&[
            record("SKU-LOW", upcoming(1), 5.0),
            record("SKU-LOW", upcoming(2), 5.0),
            record("SKU-HIGH", upcoming(1), 40.0),
            record("SKU-HIGH", upcoming(2), 45.0),
            // Outside the 7-day window; must not count.
            record("SKU-HIGH", upcoming(30), 1000.0),
        ])
        .await
        .expect("refresh");

        let totals = repo.totals_next_days(7, 10).await.expect("totals");
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].sku.as_str(), "SKU-HIGH");
        assert!((totals[0].total_forecast - 85.0).abs() < 1e-9);
        assert_eq!(totals[1].sku.as_str(), "SKU-LOW");
    }

    #[tokio::test]
    async fn lookup_resolves_legacy_yhat_column() {
        let pool = setup().await;

        // Simulate an older loader's table shape.
        sqlx::query("DROP TABLE demand_forecast").execute(&pool).await.expect("drop");
        sqlx::query("CREATE TABLE demand_forecast (date TEXT NOT NULL, sku TEXT NOT NULL, yhat REAL NOT NULL)")
            .execute(&pool)
            .await
            .expect("recreate");
        sqlx::query("INSERT INTO demand_forecast (date, sku, yhat) VALUES (?, 'SKU1', 7.5)")
            .bind(upcoming(1).format("%Y-%m-%d").to_string())
            .execute(&pool)
            .await
            .expect("insert");

        let repo = SqlForecastRepository::new(pool);
        assert_eq!(repo.value_column().await.expect("resolve"), "yhat");

        let totals = repo.totals_next_days(7, 10).await.expect("totals");
        assert_eq!(totals.len(), 1);
        assert!((totals[0].total_forecast - 7.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn lookup_fails_loudly_when_no_candidate_column_exists() {
        let pool = setup().await;

        sqlx::query("DROP TABLE demand_forecast").execute(&pool).await.expect("drop");
        sqlx::query("CREATE TABLE demand_forecast (date TEXT NOT NULL, sku TEXT NOT NULL, units REAL NOT NULL)")
            .execute(&pool)
            .await
            .expect("recreate");

        let repo = SqlForecastRepository::new(pool);
        let error = repo.series_for_sku(&Sku("SKU1".to_string()), 7).await.expect_err("mismatch");

        let RepositoryError::SchemaMismatch { table, available } = error else {
            panic!("expected schema mismatch, got {error:?}");
        };
        assert_eq!(table, "demand_forecast");
        assert!(available.contains(&"units".to_string()));
    }

    #[tokio::test]
    async fn empty_series_is_a_valid_result() {
        let pool = setup().await;
        let repo = SqlForecastRepository::new(pool);

        let series = repo.series_for_sku(&Sku("GHOST".to_string()), 7).await.expect("series");
        assert!(series.is_empty());
    }
}
