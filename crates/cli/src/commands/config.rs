use serde_json::json;

use crate::commands::{load_config, CommandResult};

/// Renders the effective configuration. Secrets are redacted, not echoed.
pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let rendered = json!({
        "database": {
            "url": config.database.url,
            "max_connections": config.database.max_connections,
            "timeout_secs": config.database.timeout_secs,
        },
        "warehouse": {
            "project_id": config.warehouse.project_id,
            "dataset": config.warehouse.dataset,
        },
        "llm": {
            "provider": format!("{:?}", config.llm.provider).to_lowercase(),
            "model": config.llm.model,
            "base_url": config.llm.base_url,
            "api_key": config.llm.api_key.as_ref().map(|_| "<redacted>"),
            "timeout_secs": config.llm.timeout_secs,
            "max_retries": config.llm.max_retries,
        },
        "gate": {
            "auto_approval_threshold": config.gate.auto_approval_threshold,
        },
        "batch": {
            "forecast_horizon_days": config.batch.forecast_horizon_days,
            "cross_sell_limit": config.batch.cross_sell_limit,
            "pricing_window_days": config.batch.pricing_window_days,
        },
        "server": {
            "bind_address": config.server.bind_address,
            "port": config.server.port,
            "graceful_shutdown_secs": config.server.graceful_shutdown_secs,
        },
        "logging": {
            "level": config.logging.level,
            "format": format!("{:?}", config.logging.format).to_lowercase(),
        },
    });

    CommandResult::success("config", rendered.to_string())
}
