//! JSON Schema for `go-instrument.json`, for editor completion and
//! validation.

use crate::types::InstrumentConfig;
use schemars::{Schema, generate::SchemaSettings};

pub fn schema() -> Schema {
    SchemaSettings::default()
        .into_generator()
        .into_root_schema_for::<InstrumentConfig>()
}

/// The schema as a pretty-printed JSON string.
pub fn schema_json_pretty() -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&schema())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> jsonschema::Validator {
        jsonschema::validator_for(&serde_json::to_value(schema()).unwrap()).unwrap()
    }

    #[test]
    fn schema_documents_every_section() {
        let json = schema_json_pretty().unwrap();
        for key in ["metric_prefixes", "reporter", "output", "interfaces", "exclude", "logging"] {
            assert!(json.contains(&format!("\"{key}\"")), "missing {key}");
        }
    }

    #[test]
    fn default_config_validates() {
        let config = serde_json::to_value(InstrumentConfig::default()).unwrap();
        assert!(validator().validate(&config).is_ok());
    }

    #[test]
    fn partial_config_validates() {
        let config = json!({
            "metric_prefixes": ["Get.*:store.get"],
            "output": {"dirname": "metrics"}
        });
        assert!(validator().validate(&config).is_ok());
    }

    #[test]
    fn wrong_types_are_rejected() {
        let config = json!({"metric_prefixes": "Get:get"});
        assert!(validator().validate(&config).is_err());
    }
}
