use chrono::{Days, Utc};

use crate::commands::{build_runtime, load_config, CommandResult};
use stocky_core::pricing::{DeterministicPriceEngine, PriceEngine};
use stocky_db::connect_with_settings;
use stocky_db::repositories::{
    PriceRecommendationRepository, SalesHistoryRepository, SqlPriceRecommendationRepository,
    SqlSalesHistoryRepository,
};

/// Appends one price-recommendation run over the configured sales window.
/// Rows accumulate across runs; readers pick the latest per product.
pub fn run() -> CommandResult {
    let config = match load_config("pricing") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let runtime = match build_runtime("pricing") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let cutoff =
            Utc::now().date_naive() - Days::new(u64::from(config.batch.pricing_window_days));
        let aggregates = SqlSalesHistoryRepository::new(pool.clone())
            .aggregates_since(cutoff)
            .await
            .map_err(|error| ("upstream_query", error.to_string(), 6u8))?;

        if aggregates.is_empty() {
            pool.close().await;
            return Ok::<_, (&'static str, String, u8)>(0u64);
        }

        let engine = DeterministicPriceEngine;
        let as_of = Utc::now();
        let recommendations: Vec<_> =
            aggregates.iter().map(|aggregate| engine.recommend(aggregate, as_of)).collect();

        let written = SqlPriceRecommendationRepository::new(pool.clone())
            .append_run(&recommendations)
            .await
            .map_err(|error| ("recommendation_write", error.to_string(), 7u8))?;
        pool.close().await;
        Ok(written)
    });

    match result {
        Ok(0) => CommandResult::success(
            "pricing",
            "no sales in the recommendation window; nothing to price",
        ),
        Ok(written) => {
            CommandResult::success("pricing", format!("appended {written} price recommendations"))
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("pricing", error_class, message, exit_code)
        }
    }
}
