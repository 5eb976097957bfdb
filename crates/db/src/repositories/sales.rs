use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::Row;

use stocky_core::domain::crosssell::CrossSellPair;
use stocky_core::domain::pricing::{ProductId, SalesAggregate};
use stocky_core::domain::sku::Sku;

use super::{RepositoryError, SalesHistoryRepository};
use crate::DbPool;

/// One sales fact as loaded by upstream ETL. Read-only input for pricing
/// and cross-sell derivation.
#[derive(Clone, Debug, PartialEq)]
pub struct SalesRecord {
    pub product_id: ProductId,
    pub unit_price: Decimal,
    pub units_sold: f64,
    pub stock_level: f64,
    pub category: Option<String>,
    pub sale_date: NaiveDate,
}

pub struct SqlSalesHistoryRepository {
    pool: DbPool,
}

impl SqlSalesHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_aggregate(row: &sqlx::sqlite::SqliteRow) -> Result<SalesAggregate, RepositoryError> {
    let product_id: String =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let avg_price: f64 =
        row.try_get("avg_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let avg_sold: f64 =
        row.try_get("avg_sold").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let avg_stock: f64 =
        row.try_get("avg_stock").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: Option<String> =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let decimal = |value: f64, field: &str| {
        Decimal::from_f64(value)
            .ok_or_else(|| RepositoryError::Decode(format!("non-finite {field}: {value}")))
    };

    Ok(SalesAggregate {
        product_id: ProductId(product_id),
        avg_unit_price: decimal(avg_price, "avg_price")?,
        avg_units_sold: decimal(avg_sold, "avg_sold")?,
        avg_stock_level: decimal(avg_stock, "avg_stock")?,
        category,
    })
}

const AGGREGATE_COLUMNS: &str = "product_id,
       AVG(unit_price) AS avg_price,
       AVG(units_sold) AS avg_sold,
       AVG(stock_level) AS avg_stock,
       MAX(category) AS category";

#[async_trait::async_trait]
impl SalesHistoryRepository for SqlSalesHistoryRepository {
    async fn insert_sales(&self, records: &[SalesRecord]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                "INSERT INTO sales_history (product_id, unit_price, units_sold, stock_level, category, sale_date)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&record.product_id.0)
            .bind(record.unit_price.to_f64().unwrap_or(0.0))
            .bind(record.units_sold)
            .bind(record.stock_level)
            .bind(&record.category)
            .bind(record.sale_date.format("%Y-%m-%d").to_string())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(records.len() as u64)
    }

    async fn aggregates_since(
        &self,
        cutoff: NaiveDate,
    ) -> Result<Vec<SalesAggregate>, RepositoryError> {
        let sql = format!(
            "SELECT {AGGREGATE_COLUMNS}
             FROM sales_history
             WHERE sale_date >= ?
             GROUP BY product_id
             ORDER BY product_id"
        );
        let rows = sqlx::query(&sql)
            .bind(cutoff.format("%Y-%m-%d").to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_aggregate).collect()
    }

    async fn aggregate_for_product(
        &self,
        product_id: &str,
        cutoff: NaiveDate,
    ) -> Result<Option<SalesAggregate>, RepositoryError> {
        let sql = format!(
            "SELECT {AGGREGATE_COLUMNS}
             FROM sales_history
             WHERE sale_date >= ? AND product_id = ?
             GROUP BY product_id"
        );
        let row = sqlx::query(&sql)
            .bind(cutoff.format("%Y-%m-%d").to_string())
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_aggregate(row)?)),
            None => Ok(None),
        }
    }

    async fn co_occurrence_pairs(&self) -> Result<Vec<CrossSellPair>, RepositoryError> {
        // Two products sold on the same day count as one co-occurrence.
        // The self-join keeps only one slot ordering, so pairs come out
        // already canonicalized.
        let rows = sqlx::query(
            "SELECT a.product_id AS sku_a, b.product_id AS sku_b, COUNT(*) AS pair_count
             FROM sales_history a
             JOIN sales_history b
               ON a.sale_date = b.sale_date AND a.product_id < b.product_id
             GROUP BY a.product_id, b.product_id
             ORDER BY a.product_id, b.product_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let sku_a: String =
                    row.try_get("sku_a").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let sku_b: String =
                    row.try_get("sku_b").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let pair_count: i64 =
                    row.try_get("pair_count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(CrossSellPair { sku_a: Sku(sku_a), sku_b: Sku(sku_b), pair_count })
            })
            .collect()
    }
}
