use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub warehouse: WarehouseConfig,
    pub llm: LlmConfig,
    pub gate: GateConfig,
    pub batch: BatchConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Trusted identifiers for the warehouse dataset. These may be interpolated
/// into table qualification (never user input).
#[derive(Clone, Debug)]
pub struct WarehouseConfig {
    pub project_id: String,
    pub dataset: String,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct GateConfig {
    /// Restock amounts at or below this execute without human approval.
    pub auto_approval_threshold: i64,
}

#[derive(Clone, Debug)]
pub struct BatchConfig {
    pub forecast_horizon_days: u32,
    pub cross_sell_limit: u32,
    pub pricing_window_days: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub auto_approval_threshold: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://stocky.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            warehouse: WarehouseConfig {
                project_id: "local".to_string(),
                dataset: "warehouse".to_string(),
            },
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            gate: GateConfig { auto_approval_threshold: 100 },
            batch: BatchConfig {
                forecast_horizon_days: 7,
                cross_sell_limit: 3,
                pricing_window_days: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("stocky.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(warehouse) = patch.warehouse {
            if let Some(project_id) = warehouse.project_id {
                self.warehouse.project_id = project_id;
            }
            if let Some(dataset) = warehouse.dataset {
                self.warehouse.dataset = dataset;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(api_key.into());
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(gate) = patch.gate {
            if let Some(threshold) = gate.auto_approval_threshold {
                self.gate.auto_approval_threshold = threshold;
            }
        }

        if let Some(batch) = patch.batch {
            if let Some(horizon) = batch.forecast_horizon_days {
                self.batch.forecast_horizon_days = horizon;
            }
            if let Some(limit) = batch.cross_sell_limit {
                self.batch.cross_sell_limit = limit;
            }
            if let Some(window) = batch.pricing_window_days {
                self.batch.pricing_window_days = window;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STOCKY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("STOCKY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("STOCKY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("STOCKY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("STOCKY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("STOCKY_WAREHOUSE_PROJECT_ID") {
            self.warehouse.project_id = value;
        }
        if let Some(value) = read_env("STOCKY_WAREHOUSE_DATASET") {
            self.warehouse.dataset = value;
        }

        if let Some(value) = read_env("STOCKY_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("STOCKY_LLM_API_KEY") {
            self.llm.api_key = Some(value.into());
        }
        if let Some(value) = read_env("STOCKY_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("STOCKY_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("STOCKY_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("STOCKY_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("STOCKY_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("STOCKY_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("STOCKY_GATE_AUTO_APPROVAL_THRESHOLD") {
            self.gate.auto_approval_threshold =
                parse_i64("STOCKY_GATE_AUTO_APPROVAL_THRESHOLD", &value)?;
        }

        if let Some(value) = read_env("STOCKY_BATCH_FORECAST_HORIZON_DAYS") {
            self.batch.forecast_horizon_days =
                parse_u32("STOCKY_BATCH_FORECAST_HORIZON_DAYS", &value)?;
        }
        if let Some(value) = read_env("STOCKY_BATCH_CROSS_SELL_LIMIT") {
            self.batch.cross_sell_limit = parse_u32("STOCKY_BATCH_CROSS_SELL_LIMIT", &value)?;
        }
        if let Some(value) = read_env("STOCKY_BATCH_PRICING_WINDOW_DAYS") {
            self.batch.pricing_window_days =
                parse_u32("STOCKY_BATCH_PRICING_WINDOW_DAYS", &value)?;
        }

        if let Some(value) = read_env("STOCKY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("STOCKY_SERVER_PORT") {
            self.server.port = parse_u16("STOCKY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("STOCKY_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("STOCKY_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("STOCKY_LOGGING_LEVEL").or_else(|| read_env("STOCKY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STOCKY_LOGGING_FORMAT").or_else(|| read_env("STOCKY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(threshold) = overrides.auto_approval_threshold {
            self.gate.auto_approval_threshold = threshold;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_warehouse(&self.warehouse)?;
        validate_llm(&self.llm)?;
        validate_gate(&self.gate)?;
        validate_batch(&self.batch)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("stocky.toml"), PathBuf::from("config/stocky.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_warehouse(warehouse: &WarehouseConfig) -> Result<(), ConfigError> {
    for (key, value) in
        [("warehouse.project_id", &warehouse.project_id), ("warehouse.dataset", &warehouse.dataset)]
    {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
        let valid = trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-'));
        if !valid {
            return Err(ConfigError::Validation(format!(
                "{key} may only contain alphanumerics, `_`, and `-` (got `{trimmed}`)"
            )));
        }
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    match llm.provider {
        LlmProvider::OpenAi | LlmProvider::Anthropic => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for openai/anthropic providers".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_gate(gate: &GateConfig) -> Result<(), ConfigError> {
    if gate.auto_approval_threshold <= 0 {
        return Err(ConfigError::Validation(
            "gate.auto_approval_threshold must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

fn validate_batch(batch: &BatchConfig) -> Result<(), ConfigError> {
    if batch.forecast_horizon_days == 0 || batch.forecast_horizon_days > 90 {
        return Err(ConfigError::Validation(
            "batch.forecast_horizon_days must be in range 1..=90".to_string(),
        ));
    }
    if batch.cross_sell_limit == 0 || batch.cross_sell_limit > 50 {
        return Err(ConfigError::Validation(
            "batch.cross_sell_limit must be in range 1..=50".to_string(),
        ));
    }
    if batch.pricing_window_days == 0 || batch.pricing_window_days > 365 {
        return Err(ConfigError::Validation(
            "batch.pricing_window_days must be in range 1..=365".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    warehouse: Option<WarehousePatch>,
    llm: Option<LlmPatch>,
    gate: Option<GatePatch>,
    batch: Option<BatchPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WarehousePatch {
    project_id: Option<String>,
    dataset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct GatePatch {
    auto_approval_threshold: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct BatchPatch {
    forecast_horizon_days: Option<u32>,
    cross_sell_limit: Option<u32>,
    pricing_window_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
