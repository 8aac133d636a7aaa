//! Integration tests for go-instrument config commands.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn go_instrument_cmd(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("go-instrument");
    cmd.env("XDG_CONFIG_HOME", home.path().join("xdg"))
        .env_remove("GO_INSTRUMENT_PREFIX")
        .env_remove("GO_INSTRUMENT_METRIC_PREFIXES")
        .env_remove("GO_INSTRUMENT_LOG_LEVEL")
        .env_remove("GO_INSTRUMENT_LOG_JSON");
    cmd
}

#[test]
fn test_schema_outputs_valid_json() {
    let temp = TempDir::new().unwrap();
    go_instrument_cmd(&temp)
        .args(["config", "schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"$defs\"").or(predicate::str::contains("\"definitions\"")))
        .stdout(predicate::str::contains("InstrumentConfig"));
}

#[test]
fn test_show_outputs_json() {
    let temp = TempDir::new().unwrap();
    go_instrument_cmd(&temp)
        .args(["config", "show", "--path", temp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"metric_prefixes\""))
        .stdout(predicate::str::contains("\"reporter\""));
}

#[test]
fn test_init_creates_config_file() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("go-instrument.json");

    go_instrument_cmd(&temp)
        .current_dir(temp.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let content = std::fs::read_to_string(&config_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["metric_prefixes"][0], ".+:instrumented");
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("go-instrument.json"), "{}").unwrap();

    go_instrument_cmd(&temp)
        .current_dir(temp.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    go_instrument_cmd(&temp)
        .current_dir(temp.path())
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_validate_reports_warnings() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("go-instrument.json"),
        r#"{"metric_prefixes": ["no-separator"]}"#,
    )
    .unwrap();

    go_instrument_cmd(&temp)
        .args(["config", "validate", "--path", temp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("WARN"))
        .stdout(predicate::str::contains("metric_prefixes.invalid"));
}

#[test]
fn test_validate_accepts_clean_config() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("go-instrument.json"),
        r#"{"metric_prefixes": [".+:svc"]}"#,
    )
    .unwrap();

    go_instrument_cmd(&temp)
        .args(["config", "validate", "--path", temp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}
