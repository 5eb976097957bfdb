use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use stocky_agent::llm::{HttpLlmClient, LlmClient};
use stocky_agent::runtime::AgentRuntime;
use stocky_agent::tools::{
    CrossSellTool, ForecastLookupTool, ForecastSummaryTool, PriceCheckTool, RestockOrderTool,
    ToolRegistry,
};
use stocky_core::audit::TracingAuditSink;
use stocky_core::config::{AppConfig, ConfigError, LoadOptions};
use stocky_core::gate::{GatePolicy, RestockGate};
use stocky_core::pricing::DeterministicPriceEngine;
use stocky_db::repositories::{
    SqlCrossSellRepository, SqlForecastRepository, SqlPendingActionLedger,
    SqlSalesHistoryRepository,
};
use stocky_db::{connect_with_settings, migrations, DbPool};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub agent_runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client construction failed: {0}")]
    Llm(String),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let agent_runtime = Arc::new(build_runtime(&config, &db_pool)?);

    Ok(Application { config, db_pool, agent_runtime })
}

fn build_runtime(config: &AppConfig, pool: &DbPool) -> Result<AgentRuntime, BootstrapError> {
    let ledger = Arc::new(SqlPendingActionLedger::new(pool.clone()));
    let gate = Arc::new(RestockGate::new(
        GatePolicy::new(config.gate.auto_approval_threshold),
        ledger,
        Arc::new(TracingAuditSink),
    ));

    let forecasts = Arc::new(SqlForecastRepository::new(pool.clone()));
    let pairs = Arc::new(SqlCrossSellRepository::new(pool.clone()));
    let sales = Arc::new(SqlSalesHistoryRepository::new(pool.clone()));

    let mut registry = ToolRegistry::default();
    registry.register(ForecastSummaryTool::new(forecasts.clone()));
    registry.register(ForecastLookupTool::new(forecasts));
    registry.register(RestockOrderTool::new(gate));
    registry.register(CrossSellTool::new(pairs, config.batch.cross_sell_limit));
    registry.register(PriceCheckTool::new(
        sales,
        Arc::new(DeterministicPriceEngine),
        config.batch.pricing_window_days,
    ));

    let llm: Arc<dyn LlmClient> = Arc::new(
        HttpLlmClient::from_config(&config.llm)
            .map_err(|error| BootstrapError::Llm(error.to_string()))?,
    );

    Ok(AgentRuntime::new(registry, Some(llm)))
}

#[cfg(test)]
mod tests {
    use stocky_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_threshold() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                auto_approval_threshold: Some(0),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("auto_approval_threshold"));
    }

    #[tokio::test]
    async fn bootstrap_connects_migrates_and_builds_the_runtime() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN \
             ('daily_demand', 'demand_forecast', 'cross_sell_pairs', 'pending_actions', \
              'price_recommendation', 'sales_history')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected warehouse tables to be available after bootstrap");
        assert_eq!(table_count, 6, "bootstrap should expose all warehouse tables");

        // The runtime routes an explicit directive end to end over the
        // freshly migrated (empty) store.
        let response = app.agent_runtime.handle_prompt("forecast SKU-NONE", "req-bootstrap").await;
        assert!(
            response.contains("No forecast available"),
            "empty store should answer with the informational empty result, got: {response}"
        );

        app.db_pool.close().await;
    }
}
