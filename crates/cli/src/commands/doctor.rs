use sqlx::Row;

use crate::commands::{build_runtime, load_config, CommandResult};
use stocky_core::gate::PendingActionLedger;
use stocky_db::connect_with_settings;
use stocky_db::repositories::{SqlForecastRepository, SqlPendingActionLedger};

const EXPECTED_TABLES: &[&str] = &[
    "daily_demand",
    "demand_forecast",
    "cross_sell_pairs",
    "pending_actions",
    "price_recommendation",
    "sales_history",
];

/// Readiness checks: configuration, connectivity, schema presence, and the
/// forecast value-column negotiation.
pub fn run() -> CommandResult {
    let config = match load_config("doctor") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let runtime = match build_runtime("doctor") {
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

        let mut present = 0usize;
        for table in EXPECTED_TABLES {
            let count = sqlx::query(
                "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .map_err(|error| ("schema_check", error.to_string(), 5u8))?
            .get::<i64, _>("count");
            if count == 1 {
                present += 1;
            }
        }
        if present != EXPECTED_TABLES.len() {
            pool.close().await;
            return Err((
                "schema_check",
                format!(
                    "only {present}/{} warehouse tables present; run `stocky migrate`",
                    EXPECTED_TABLES.len()
                ),
                5u8,
            ));
        }

        let forecast_column = SqlForecastRepository::new(pool.clone())
            .value_column()
            .await
            .map_err(|error| ("schema_mismatch", error.to_string(), 6u8))?;

        let pending = SqlPendingActionLedger::new(pool.clone())
            .list_pending(100)
            .await
            .map_err(|error| ("upstream_query", error.to_string(), 7u8))?;

        pool.close().await;
        Ok::<_, (&'static str, String, u8)>((forecast_column, pending.len()))
    });

    match result {
        Ok((forecast_column, pending_count)) => CommandResult::success(
            "doctor",
            format!(
                "config ok; database ok; tables ok ({}/{}); forecast value column `{forecast_column}`; {pending_count} pending actions awaiting approval; gate threshold {}",
                EXPECTED_TABLES.len(),
                EXPECTED_TABLES.len(),
                config.gate.auto_approval_threshold
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("doctor", error_class, message, exit_code)
        }
    }
}
