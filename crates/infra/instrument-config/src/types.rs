//! Configuration types for go-instrument.
//!
//! The root type is [`InstrumentConfig`]. Every struct uses
//! `#[serde(default)]` so partial files deserialize cleanly.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Root configuration, loaded from `go-instrument.json` files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Optional JSON Schema URL for editor support.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Ordered `pattern:prefix` rules. The first pattern matching a method
    /// name decides its metric prefix; unmatched methods are not wrapped.
    pub metric_prefixes: Vec<String>,

    /// Inserted into decorator names as `Instrumented<prefix><Interface>`.
    pub prefix: String,

    /// The metrics reporter decorators call into.
    pub reporter: ReporterConfig,

    /// Where and how generated files are written.
    pub output: OutputConfig,

    /// Only generate decorators for these interfaces (all when empty).
    pub interfaces: Vec<String>,

    /// Never generate decorators for these interfaces.
    pub exclude: Vec<String>,

    /// Logging and diagnostics.
    pub logging: LoggingConfig,
}

/// Reporter type and method names used by generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ReporterConfig {
    /// Import path of the package declaring the reporter type.
    pub import_path: String,

    /// Reporter type name; decorators hold a pointer to it.
    pub type_name: String,

    /// Called with the metric prefix before delegating.
    pub request_method: String,

    /// Called with the metric prefix and the error result (or nil).
    pub error_method: String,

    /// Called with the metric prefix and the elapsed seconds.
    pub duration_method: String,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            import_path: "github.com/efritz/imperial/red".into(),
            type_name: "Reporter".into(),
            request_method: "ReportRequest".into(),
            error_method: "ReportError".into(),
            duration_method: "ReportDuration".into(),
        }
    }
}

/// Output placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory relative to each source directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirname: Option<String>,

    /// Single output file name; defaults to `<source>_instrumented.go`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Package clause of generated files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Overwrite existing files.
    pub force: bool,
}

/// Logging and diagnostics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Whether to enable JSON-formatted logs.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            json: false,
        }
    }
}
