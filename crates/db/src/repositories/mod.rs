use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use stocky_core::domain::crosssell::{CrossSellPair, CrossSellSuggestion};
use stocky_core::domain::demand::{DemandObservation, ForecastRecord};
use stocky_core::domain::pricing::{PriceRecommendation, SalesAggregate};
use stocky_core::domain::sku::Sku;
use stocky_core::errors::ApplicationError;

pub mod cross_sell;
pub mod demand;
pub mod forecast;
pub mod ledger;
pub mod memory;
pub mod pricing;
pub mod sales;

pub use cross_sell::SqlCrossSellRepository;
pub use demand::SqlDemandRepository;
pub use forecast::SqlForecastRepository;
pub use ledger::SqlPendingActionLedger;
pub use memory::{InMemoryCrossSellRepository, InMemoryForecastRepository, InMemoryPendingActionLedger};
pub use pricing::SqlPriceRecommendationRepository;
pub use sales::{SalesRecord, SqlSalesHistoryRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("no recognized value column in `{table}`: table has {available:?}")]
    SchemaMismatch { table: String, available: Vec<String> },
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Database(error) => Self::UpstreamQuery(error.to_string()),
            RepositoryError::Decode(message) => Self::UpstreamQuery(message),
            RepositoryError::SchemaMismatch { table, available } => Self::SchemaMismatch {
                table,
                candidates: stocky_core::schema::FORECAST_VALUE_COLUMNS
                    .iter()
                    .map(|name| (*name).to_string())
                    .collect(),
                available,
            },
        }
    }
}

/// Aggregated 7-day outlook for one SKU, read side of the forecast table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkuForecastTotal {
    pub sku: Sku,
    pub total_forecast: f64,
}

#[async_trait]
pub trait DemandRepository: Send + Sync {
    async fn load_history(&self) -> Result<Vec<DemandObservation>, RepositoryError>;
    async fn insert_observations(
        &self,
        observations: &[DemandObservation],
    ) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait ForecastRepository: Send + Sync {
    /// Replaces the whole forecast table with `records` in one transaction.
    /// Incremental updates are not supported; mixing runs would mix
    /// forecast vintages.
    async fn replace_all(&self, records: &[ForecastRecord]) -> Result<u64, RepositoryError>;

    /// Top `limit` SKUs by summed forecast over the next `days` days.
    async fn totals_next_days(
        &self,
        days: u32,
        limit: u32,
    ) -> Result<Vec<SkuForecastTotal>, RepositoryError>;

    /// Up to `days` forecast rows for one SKU, ordered by date.
    async fn series_for_sku(
        &self,
        sku: &Sku,
        days: u32,
    ) -> Result<Vec<ForecastRecord>, RepositoryError>;
}

#[async_trait]
pub trait CrossSellRepository: Send + Sync {
    async fn top_for_sku(
        &self,
        sku: &Sku,
        limit: u32,
    ) -> Result<Vec<CrossSellSuggestion>, RepositoryError>;

    /// Replaces the pair table with a freshly derived snapshot.
    async fn replace_pairs(&self, pairs: &[CrossSellPair]) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait SalesHistoryRepository: Send + Sync {
    async fn insert_sales(&self, records: &[SalesRecord]) -> Result<u64, RepositoryError>;

    /// Per-product averages over sales on or after `cutoff`.
    async fn aggregates_since(
        &self,
        cutoff: NaiveDate,
    ) -> Result<Vec<SalesAggregate>, RepositoryError>;

    async fn aggregate_for_product(
        &self,
        product_id: &str,
        cutoff: NaiveDate,
    ) -> Result<Option<SalesAggregate>, RepositoryError>;

    /// Same-day co-occurrence counts, canonicalized `sku_a < sku_b`.
    async fn co_occurrence_pairs(&self) -> Result<Vec<CrossSellPair>, RepositoryError>;
}

#[async_trait]
pub trait PriceRecommendationRepository: Send + Sync {
    /// Appends one pricing run. Rows accumulate across runs; readers pick
    /// the latest per product by `last_updated`.
    async fn append_run(&self, rows: &[PriceRecommendation]) -> Result<u64, RepositoryError>;
}
