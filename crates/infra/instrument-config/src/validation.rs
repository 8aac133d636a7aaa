//! Advisory validation for [`InstrumentConfig`].
//!
//! Warnings never block a run; malformed rules still fail later, when the
//! rule set is parsed for generation.

use instrument_core::PrefixRule;

use crate::types::InstrumentConfig;

/// An advisory warning about a configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryWarning {
    /// Machine-readable warning code.
    pub code: &'static str,

    /// Human-readable warning message.
    pub message: String,

    /// JSON path to the problematic config field.
    pub path: &'static str,
}

impl std::fmt::Display for AdvisoryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a configuration and return advisory warnings.
pub fn validate(cfg: &InstrumentConfig) -> Vec<AdvisoryWarning> {
    let mut warnings = vec![];

    if cfg.metric_prefixes.is_empty() {
        warnings.push(AdvisoryWarning {
            code: "metric_prefixes.empty",
            path: "metric_prefixes",
            message: "no rules configured; decorators will not instrument any method".into(),
        });
    }
    for raw in &cfg.metric_prefixes {
        if let Err(e) = PrefixRule::parse(raw) {
            warnings.push(AdvisoryWarning {
                code: "metric_prefixes.invalid",
                path: "metric_prefixes",
                message: e.to_string(),
            });
        }
    }

    if !cfg.prefix.is_empty() && !is_identifier_tail(&cfg.prefix) {
        warnings.push(AdvisoryWarning {
            code: "prefix.invalid",
            path: "prefix",
            message: format!("'{}' cannot appear in a Go identifier", cfg.prefix),
        });
    }

    let reporter = &cfg.reporter;
    for (value, path, code) in [
        (&reporter.type_name, "reporter.type_name", "reporter.type_name.invalid"),
        (&reporter.request_method, "reporter.request_method", "reporter.request_method.invalid"),
        (&reporter.error_method, "reporter.error_method", "reporter.error_method.invalid"),
        (&reporter.duration_method, "reporter.duration_method", "reporter.duration_method.invalid"),
    ] {
        if !is_identifier(value) {
            warnings.push(AdvisoryWarning {
                code,
                path,
                message: format!("'{value}' is not a Go identifier"),
            });
        }
    }

    if let Some(package) = &cfg.output.package
        && !is_identifier(package)
    {
        warnings.push(AdvisoryWarning {
            code: "output.package.invalid",
            path: "output.package",
            message: format!("'{package}' is not a valid package name"),
        });
    }
    if let Some(filename) = &cfg.output.filename
        && !filename.ends_with(".go")
    {
        warnings.push(AdvisoryWarning {
            code: "output.filename.extension",
            path: "output.filename",
            message: format!("'{filename}' does not end in .go"),
        });
    }

    for name in cfg.interfaces.iter().filter(|name| cfg.exclude.contains(name)) {
        warnings.push(AdvisoryWarning {
            code: "interfaces.excluded",
            path: "interfaces",
            message: format!("'{name}' is both selected and excluded"),
        });
    }

    if !LOG_LEVELS.contains(&cfg.logging.level.to_lowercase().as_str()) {
        warnings.push(AdvisoryWarning {
            code: "logging.level.invalid",
            path: "logging.level",
            message: format!(
                "Unknown log level '{}'. Expected one of: {}",
                cfg.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    warnings
}

fn is_identifier(s: &str) -> bool {
    s.chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && is_identifier_tail(s)
}

fn is_identifier_tail(s: &str) -> bool {
    s.chars().all(|c| c.is_alphanumeric() || c == '_')
}
