use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use tempfile::TempDir;

use stocky_cli::commands::{config, doctor, forecast, migrate, pairs, pricing, seed};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn with_env(vars: &[(&str, &str)], test: impl FnOnce()) {
    let lock = ENV_LOCK.get_or_init(|| Mutex::new(()));
    let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let all_keys = [
        "STOCKY_DATABASE_URL",
        "STOCKY_GATE_AUTO_APPROVAL_THRESHOLD",
        "STOCKY_LOG_LEVEL",
    ];
    for key in all_keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test();

    for key in all_keys {
        env::remove_var(key);
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be a JSON payload")
}

fn temp_database() -> (TempDir, String) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("stocky-test.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    (dir, url)
}

#[test]
fn migrate_returns_success_with_valid_env() {
    let (_dir, url) = temp_database();
    with_env(&[("STOCKY_DATABASE_URL", &url)], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn config_validation_failure_uses_exit_code_two() {
    with_env(&[("STOCKY_GATE_AUTO_APPROVAL_THRESHOLD", "0")], || {
        let result = forecast::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn forecast_reports_empty_history_as_a_valid_outcome() {
    let (_dir, url) = temp_database();
    with_env(&[("STOCKY_DATABASE_URL", &url)], || {
        assert_eq!(migrate::run().exit_code, 0);

        let result = forecast::run();
        assert_eq!(result.exit_code, 0, "empty history is not an error: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert!(
            payload["message"].as_str().unwrap_or_default().contains("no forecasts generated"),
            "unexpected message: {}",
            result.output
        );
    });
}

#[test]
fn doctor_flags_a_missing_schema() {
    let (_dir, url) = temp_database();
    with_env(&[("STOCKY_DATABASE_URL", &url)], || {
        let result = doctor::run();
        assert_eq!(result.exit_code, 5, "expected schema check failure: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "schema_check");
        assert!(payload["message"].as_str().unwrap_or_default().contains("stocky migrate"));
    });
}

#[test]
fn batch_pipeline_runs_end_to_end_over_seeded_data() {
    let (_dir, url) = temp_database();
    with_env(&[("STOCKY_DATABASE_URL", &url)], || {
        assert_eq!(migrate::run().exit_code, 0);

        let seeded = seed::run();
        assert_eq!(seeded.exit_code, 0, "seed failed: {}", seeded.output);

        let forecasted = forecast::run();
        assert_eq!(forecasted.exit_code, 0, "forecast failed: {}", forecasted.output);
        let payload = parse_payload(&forecasted.output);
        assert!(
            payload["message"].as_str().unwrap_or_default().contains("replaced forecast table"),
            "unexpected forecast message: {}",
            forecasted.output
        );

        let paired = pairs::run();
        assert_eq!(paired.exit_code, 0, "pairs failed: {}", paired.output);
        assert!(parse_payload(&paired.output)["message"]
            .as_str()
            .unwrap_or_default()
            .contains("cross-sell pairs"));

        let priced = pricing::run();
        assert_eq!(priced.exit_code, 0, "pricing failed: {}", priced.output);
        assert!(parse_payload(&priced.output)["message"]
            .as_str()
            .unwrap_or_default()
            .contains("price recommendations"));

        let checked = doctor::run();
        assert_eq!(checked.exit_code, 0, "doctor failed: {}", checked.output);
        assert!(parse_payload(&checked.output)["message"]
            .as_str()
            .unwrap_or_default()
            .contains("forecast value column `predicted_demand`"));
    });
}

#[test]
fn config_command_redacts_secrets() {
    with_env(&[], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0, "config render failed: {}", result.output);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().expect("message is rendered config");
        let rendered: Value = serde_json::from_str(message).expect("rendered config is JSON");
        assert_eq!(rendered["gate"]["auto_approval_threshold"], 100);
        assert_eq!(rendered["batch"]["forecast_horizon_days"], 7);
    });
}
