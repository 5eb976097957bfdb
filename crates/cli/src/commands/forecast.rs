use std::collections::BTreeSet;

use crate::commands::{build_runtime, load_config, CommandResult};
use stocky_core::refresh_forecasts;
use stocky_db::connect_with_settings;
use stocky_db::repositories::{
    DemandRepository, ForecastRepository, SqlDemandRepository, SqlForecastRepository,
};

/// Daily forecast refresh. The whole forecast table is replaced with this
/// run's output; partial updates would mix forecast vintages.
pub fn run() -> CommandResult {
    let config = match load_config("forecast") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let runtime = match build_runtime("forecast") {
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

        let history = SqlDemandRepository::new(pool.clone())
            .load_history()
            .await
            .map_err(|error| ("upstream_query", error.to_string(), 6u8))?;

        let records = refresh_forecasts(&history, config.batch.forecast_horizon_days);
        let sku_count: usize =
            records.iter().map(|record| record.sku.as_str()).collect::<BTreeSet<_>>().len();

        if records.is_empty() {
            pool.close().await;
            return Ok::<_, (&'static str, String, u8)>((0u64, 0usize));
        }

        let written = SqlForecastRepository::new(pool.clone())
            .replace_all(&records)
            .await
            .map_err(|error| ("forecast_write", error.to_string(), 7u8))?;
        pool.close().await;
        Ok((written, sku_count))
    });

    match result {
        Ok((0, _)) => CommandResult::success("forecast", "no forecasts generated (empty demand history)"),
        Ok((written, sku_count)) => CommandResult::success(
            "forecast",
            format!("replaced forecast table with {written} rows across {sku_count} skus"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("forecast", error_class, message, exit_code)
        }
    }
}
