use crate::commands::{build_runtime, load_config, CommandResult};
use stocky_db::{connect_with_settings, migrations, seed_demo};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let runtime = match build_runtime("seed") {
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
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        let summary =
            seed_demo(&pool).await.map_err(|error| ("seed", error.to_string(), 6u8))?;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(summary)
    });

    match result {
        Ok(summary) => CommandResult::success(
            "seed",
            format!(
                "loaded demo dataset: {} demand rows, {} sales rows, {} cross-sell pairs",
                summary.demand_rows, summary.sales_rows, summary.pair_rows
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
