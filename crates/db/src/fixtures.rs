//! Deterministic demo dataset for `stocky seed` and local smoke runs.
//!
//! Dates are anchored to the current day so forecasts and pricing windows
//! land where the lookup tools expect them; everything else is fixed.

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stocky_core::domain::demand::DemandObservation;
use stocky_core::domain::pricing::ProductId;
use stocky_core::domain::sku::Sku;

use crate::repositories::{
    CrossSellRepository, DemandRepository, RepositoryError, SalesHistoryRepository, SalesRecord,
    SqlCrossSellRepository, SqlDemandRepository, SqlSalesHistoryRepository,
};
use crate::DbPool;

const DEMAND_DAYS: u64 = 14;
const SALES_DAYS: u64 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub demand_rows: u64,
    pub sales_rows: u64,
    pub pair_rows: u64,
}

fn days_ago(offset: u64) -> NaiveDate {
    Utc::now().date_naive() - Days::new(offset)
}

fn demand_fixture() -> Vec<DemandObservation> {
    let mut rows = Vec::new();
    for offset in 1..=DEMAND_DAYS {
        let date = days_ago(offset);
        let day = (DEMAND_DAYS - offset) as i64;

        // A steady mover, a grower, and a seesaw.
        rows.push(DemandObservation { date, sku: Sku("SKU-ANVIL".to_string()), picks: 12 });
        rows.push(DemandObservation { date, sku: Sku("SKU-BOLT".to_string()), picks: 5 + day });
        rows.push(DemandObservation {
            date,
            sku: Sku("SKU-CRATE".to_string()),
            picks: if day % 2 == 0 { 8 } else { 14 },
        });
    }
    rows
}

fn sales_fixture() -> Vec<SalesRecord> {
    let mut rows = Vec::new();
    for offset in 1..=SALES_DAYS {
        let sale_date = days_ago(offset);

        rows.push(sales_row("P-ANVIL", "45.00", 6.0, 60.0, "hardware", sale_date));
        rows.push(sales_row("P-BOLT", "3.50", 40.0, 200.0, "hardware", sale_date));
        // Dolly sells through completely every day it appears.
        if offset % 2 == 0 {
            rows.push(sales_row("P-DOLLY", "120.00", 2.0, 0.0, "handling", sale_date));
        }
        if offset % 3 == 0 {
            rows.push(sales_row("P-CRATE", "18.00", 9.0, 45.0, "packaging", sale_date));
        }
    }
    rows
}

fn sales_row(
    product: &str,
    price: &str,
    sold: f64,
    stock: f64,
    category: &str,
    sale_date: NaiveDate,
) -> SalesRecord {
    SalesRecord {
        product_id: ProductId(product.to_string()),
        unit_price: price.parse::<Decimal>().unwrap_or_default(),
        units_sold: sold,
        stock_level: stock,
        category: Some(category.to_string()),
        sale_date,
    }
}

/// Loads the demo dataset and rebuilds cross-sell pairs from it. Safe to
/// run repeatedly: demand facts are keyed, sales rows accumulate only on
/// the first load of a given day, and the pair table is replaced.
pub async fn seed_demo(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
    let demand_repo = SqlDemandRepository::new(pool.clone());
    let sales_repo = SqlSalesHistoryRepository::new(pool.clone());
    let cross_sell_repo = SqlCrossSellRepository::new(pool.clone());

    let demand_rows = demand_repo.insert_observations(&demand_fixture()).await?;

    let sales_rows = if sales_history_is_empty(pool).await? {
        sales_repo.insert_sales(&sales_fixture()).await?
    } else {
        0
    };

    let pairs = sales_repo.co_occurrence_pairs().await?;
    let pair_rows = cross_sell_repo.replace_pairs(&pairs).await?;

    Ok(SeedSummary { demand_rows, sales_rows, pair_rows })
}

async fn sales_history_is_empty(pool: &DbPool) -> Result<bool, RepositoryError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales_history")
        .fetch_one(pool)
        .await?;
    Ok(count == 0)
}

#[cfg(test)]
mod tests {
    use stocky_core::domain::sku::Sku;

    use super::seed_demo;
    use crate::repositories::{
        CrossSellRepository, DemandRepository, SqlCrossSellRepository, SqlDemandRepository,
    };
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn seed_populates_all_three_datasets() {
        let pool = setup().await;
        let summary = seed_demo(&pool).await.expect("seed");

        assert_eq!(summary.demand_rows, 14 * 3);
        assert!(summary.sales_rows > 0);
        assert!(summary.pair_rows > 0);

        let history = SqlDemandRepository::new(pool.clone()).load_history().await.expect("load");
        assert_eq!(history.len(), 14 * 3);

        let suggestions = SqlCrossSellRepository::new(pool)
            .top_for_sku(&Sku("P-ANVIL".to_string()), 3)
            .await
            .expect("rank");
        assert!(!suggestions.is_empty(), "anvil and bolt co-occur every day");
    }

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate_facts() {
        let pool = setup().await;
        seed_demo(&pool).await.expect("first seed");
        let second = seed_demo(&pool).await.expect("second seed");

        assert_eq!(second.demand_rows, 0, "demand facts are keyed by (date, sku)");
        assert_eq!(second.sales_rows, 0, "sales rows only load into an empty table");
    }
}
