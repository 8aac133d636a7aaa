//! Layered configuration loading.
//!
//! 1. Read the global file `<config_dir>/go-instrument/go-instrument.json`
//! 2. Read the local file `./go-instrument.json` (or an explicit path)
//! 3. Build a patch from `GO_INSTRUMENT_*` environment variables
//! 4. Merge the three as RFC 7396 patches over an empty object
//! 5. Deserialize once and run advisory validation
//!
//! Command-line flags are applied by the binary on top of the result.

use crate::{merge::merge_layers, types::InstrumentConfig, validation::AdvisoryWarning};
use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};

/// Filename for local config.
pub const LOCAL_FILE: &str = "go-instrument.json";

/// Directory name under `config_dir` for global config.
pub const GLOBAL_DIR: &str = "go-instrument";

/// Filename for global config.
pub const GLOBAL_FILE: &str = "go-instrument.json";

pub const ENV_PREFIX: &str = "GO_INSTRUMENT_PREFIX";
pub const ENV_METRIC_PREFIXES: &str = "GO_INSTRUMENT_METRIC_PREFIXES";
pub const ENV_LOG_LEVEL: &str = "GO_INSTRUMENT_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "GO_INSTRUMENT_LOG_JSON";

/// Resolved paths for config files.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub local: PathBuf,
    pub global: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: InstrumentConfig,
    pub warnings: Vec<AdvisoryWarning>,
    pub paths: ConfigPaths,
}

/// Get the global config file path.
pub fn global_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config dir")?;
    Ok(base.join(GLOBAL_DIR).join(GLOBAL_FILE))
}

/// Get the local config file path for a given directory.
pub fn local_config_path(local_dir: &Path) -> PathBuf {
    local_dir.join(LOCAL_FILE)
}

/// Load configuration for `local_dir`, or from `explicit` when given.
pub fn load_merged(local_dir: &Path, explicit: Option<&Path>) -> Result<LoadedConfig> {
    let global = global_config_path()?;
    let local = explicit.map_or_else(|| local_config_path(local_dir), Path::to_path_buf);
    if let Some(path) = explicit
        && !path.exists()
    {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    load_from_paths(&global, &local)
}

/// Load configuration from specific global and local files.
pub fn load_from_paths(global: &Path, local: &Path) -> Result<LoadedConfig> {
    let global_v = read_json_object_or_empty(global)?;
    let local_v = read_json_object_or_empty(local)?;
    let env_v = env_patch();

    let merged = merge_layers([global_v, local_v, env_v]);
    let config: InstrumentConfig =
        serde_json::from_value(merged).context("Failed to deserialize merged go-instrument config")?;

    let warnings = crate::validation::validate(&config);
    for warning in &warnings {
        tracing::debug!(%warning, "config warning");
    }

    Ok(LoadedConfig {
        config,
        warnings,
        paths: ConfigPaths {
            local: local.to_path_buf(),
            global: global.to_path_buf(),
        },
    })
}

/// Environment overrides as a merge patch.
fn env_patch() -> Value {
    let mut patch = Map::new();
    if let Some(v) = env_trimmed(ENV_PREFIX) {
        patch.insert("prefix".into(), json!(v));
    }
    if let Some(v) = env_trimmed(ENV_METRIC_PREFIXES) {
        patch.insert("metric_prefixes".into(), json!(split_rules(&v)));
    }

    let mut logging = Map::new();
    if let Some(v) = env_trimmed(ENV_LOG_LEVEL) {
        logging.insert("level".into(), json!(v));
    }
    if let Some(v) = env_trimmed(ENV_LOG_JSON) {
        logging.insert("json".into(), json!(v.eq_ignore_ascii_case("true") || v == "1"));
    }
    if !logging.is_empty() {
        patch.insert("logging".into(), Value::Object(logging));
    }
    Value::Object(patch)
}

/// Split a comma-separated rule list. Commas inside a character class or a
/// `{m,n}` repetition, or escaped with `\`, belong to the pattern.
fn split_rules(raw: &str) -> Vec<&str> {
    let mut rules = Vec::new();
    let mut start = 0;
    let mut in_class = false;
    let mut braces = 0usize;
    let mut escaped = false;
    for (i, c) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '{' if !in_class => braces += 1,
            '}' if !in_class => braces = braces.saturating_sub(1),
            ',' if !in_class && braces == 0 => {
                rules.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    rules.push(&raw[start..]);
    rules
        .into_iter()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .collect()
}

/// Read and normalize an env var (trim + filter empty).
fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a JSON file as a Value, returning an empty object if it doesn't exist.
fn read_json_object_or_empty(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let v: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    match v {
        Value::Object(_) => Ok(v),
        _ => anyhow::bail!("Config root must be a JSON object: {}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn paths(temp: &TempDir) -> (PathBuf, PathBuf) {
        let global = temp.path().join("global").join(GLOBAL_DIR).join(GLOBAL_FILE);
        let local = temp.path().join("repo").join(LOCAL_FILE);
        std::fs::create_dir_all(global.parent().unwrap()).unwrap();
        std::fs::create_dir_all(local.parent().unwrap()).unwrap();
        (global, local)
    }

    #[test]
    #[serial]
    fn no_files_returns_defaults() {
        let temp = TempDir::new().unwrap();
        let (global, local) = paths(&temp);
        let loaded = load_from_paths(&global, &local).unwrap();
        assert_eq!(loaded.config, InstrumentConfig::default());
        assert_eq!(loaded.paths.local, local);
    }

    #[test]
    #[serial]
    fn local_overrides_global() {
        let temp = TempDir::new().unwrap();
        let (global, local) = paths(&temp);
        std::fs::write(
            &global,
            r#"{"prefix": "Global", "metric_prefixes": ["Get:get"], "reporter": {"type_name": "Sink"}}"#,
        )
        .unwrap();
        std::fs::write(&local, r#"{"prefix": "Local"}"#).unwrap();

        let loaded = load_from_paths(&global, &local).unwrap();
        assert_eq!(loaded.config.prefix, "Local");
        assert_eq!(loaded.config.metric_prefixes, ["Get:get"]);
        assert_eq!(loaded.config.reporter.type_name, "Sink");
    }

    #[test]
    #[serial]
    fn env_overrides_files() {
        let temp = TempDir::new().unwrap();
        let (global, local) = paths(&temp);
        std::fs::write(
            &local,
            r#"{"prefix": "File", "metric_prefixes": ["A:a"], "logging": {"level": "info"}}"#,
        )
        .unwrap();

        // SAFETY: This test runs serially via #[serial] to avoid data races
        unsafe {
            std::env::set_var(ENV_PREFIX, "Env");
            std::env::set_var(ENV_METRIC_PREFIXES, "Get.*:get, Put.*:put,");
            std::env::set_var(ENV_LOG_JSON, "TRUE");
        }

        let loaded = load_from_paths(&global, &local).unwrap();
        assert_eq!(loaded.config.prefix, "Env");
        assert_eq!(loaded.config.metric_prefixes, ["Get.*:get", "Put.*:put"]);
        assert_eq!(loaded.config.logging.level, "info");
        assert!(loaded.config.logging.json);

        // SAFETY: This test runs serially via #[serial] to avoid data races
        unsafe {
            std::env::remove_var(ENV_PREFIX);
            std::env::remove_var(ENV_METRIC_PREFIXES);
            std::env::remove_var(ENV_LOG_JSON);
        }
    }

    #[test]
    fn rule_lists_keep_commas_inside_patterns() {
        assert_eq!(
            split_rules("^[a-z]{1,3}$:x,Get:get"),
            ["^[a-z]{1,3}$:x", "Get:get"]
        );
        assert_eq!(split_rules("[,;]Sep:sep , Put:put"), ["[,;]Sep:sep", "Put:put"]);
        assert_eq!(split_rules(r"A\,B:ab,C:c"), [r"A\,B:ab", "C:c"]);
        assert!(split_rules(" , ").is_empty());
    }

    #[test]
    #[serial]
    fn env_rules_with_repetition_counts_stay_whole() {
        let temp = TempDir::new().unwrap();
        let (global, local) = paths(&temp);

        // SAFETY: This test runs serially via #[serial] to avoid data races
        unsafe {
            std::env::set_var(ENV_METRIC_PREFIXES, "^[a-z]{1,3}$:x,Get:get");
        }

        let loaded = load_from_paths(&global, &local).unwrap();
        assert_eq!(loaded.config.metric_prefixes, ["^[a-z]{1,3}$:x", "Get:get"]);

        // SAFETY: This test runs serially via #[serial] to avoid data races
        unsafe {
            std::env::remove_var(ENV_METRIC_PREFIXES);
        }
    }

    #[test]
    #[serial]
    fn env_trimmed_ignores_whitespace() {
        // SAFETY: This test runs serially via #[serial] to avoid data races
        unsafe {
            std::env::set_var("TEST_GO_INSTRUMENT_TRIM", "  value  ");
            std::env::set_var("TEST_GO_INSTRUMENT_EMPTY", "   ");
        }
        assert_eq!(env_trimmed("TEST_GO_INSTRUMENT_TRIM").as_deref(), Some("value"));
        assert_eq!(env_trimmed("TEST_GO_INSTRUMENT_EMPTY"), None);

        // SAFETY: This test runs serially via #[serial] to avoid data races
        unsafe {
            std::env::remove_var("TEST_GO_INSTRUMENT_TRIM");
            std::env::remove_var("TEST_GO_INSTRUMENT_EMPTY");
        }
    }

    #[test]
    #[serial]
    fn invalid_json_errors() {
        let temp = TempDir::new().unwrap();
        let (global, local) = paths(&temp);
        std::fs::write(&local, "not valid json").unwrap();
        let err = load_from_paths(&global, &local).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    #[serial]
    fn non_object_root_errors() {
        let temp = TempDir::new().unwrap();
        let (global, local) = paths(&temp);
        std::fs::write(&global, "[1, 2, 3]").unwrap();
        let err = load_from_paths(&global, &local).unwrap_err();
        assert!(err.to_string().contains("must be a JSON object"));
    }

    #[test]
    #[serial]
    fn wrong_field_types_error() {
        let temp = TempDir::new().unwrap();
        let (global, local) = paths(&temp);
        std::fs::write(&local, r#"{"metric_prefixes": "Get:get"}"#).unwrap();
        let err = load_from_paths(&global, &local).unwrap_err();
        assert!(err.to_string().contains("Failed to deserialize"));
    }

    #[test]
    fn missing_explicit_file_errors() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.json");
        let err = load_merged(temp.path(), Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
