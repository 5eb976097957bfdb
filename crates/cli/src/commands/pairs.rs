use crate::commands::{build_runtime, load_config, CommandResult};
use stocky_db::connect_with_settings;
use stocky_db::repositories::{
    CrossSellRepository, SalesHistoryRepository, SqlCrossSellRepository, SqlSalesHistoryRepository,
};

/// Rebuilds the cross-sell pair table from same-day co-occurrence in sales
/// history. Replace-on-refresh, like the forecast table.
pub fn run() -> CommandResult {
    let config = match load_config("pairs") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let runtime = match build_runtime("pairs") {
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

        let pairs = SqlSalesHistoryRepository::new(pool.clone())
            .co_occurrence_pairs()
            .await
            .map_err(|error| ("upstream_query", error.to_string(), 6u8))?;

        let written = SqlCrossSellRepository::new(pool.clone())
            .replace_pairs(&pairs)
            .await
            .map_err(|error| ("pair_write", error.to_string(), 7u8))?;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(written)
    });

    match result {
        Ok(0) => CommandResult::success("pairs", "no co-occurring products found; pair table is empty"),
        Ok(written) => {
            CommandResult::success("pairs", format!("rebuilt {written} cross-sell pairs"))
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("pairs", error_class, message, exit_code)
        }
    }
}
