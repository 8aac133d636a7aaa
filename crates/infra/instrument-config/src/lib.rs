//! Layered configuration for go-instrument.
//!
//! - [`InstrumentConfig`]: the root configuration type
//! - [`load_merged`]: global + local files with environment overrides
//! - [`schema`]: JSON Schema generation
//! - [`validation`]: advisory warnings that never block a run
//!
//! # Configuration Precedence (lowest to highest)
//! 1. Default values
//! 2. Global config (`~/.config/go-instrument/go-instrument.json`)
//! 3. Local config (`./go-instrument.json`, or an explicit `--config` path)
//! 4. Environment variables
//! 5. Command-line flags (applied by the binary)
//!
//! # Example
//! ```no_run
//! use instrument_config::load_merged;
//! use std::path::Path;
//!
//! let loaded = load_merged(Path::new("."), None).unwrap();
//! println!("rules: {:?}", loaded.config.metric_prefixes);
//! for warning in &loaded.warnings {
//!     eprintln!("Warning: {warning}");
//! }
//! ```
//!
//! # Environment Variables
//! - `GO_INSTRUMENT_PREFIX`: decorator name tag
//! - `GO_INSTRUMENT_METRIC_PREFIXES`: comma-separated `pattern:prefix` rules
//!   (commas inside `[...]`, `{m,n}` or after `\` stay in the pattern)
//! - `GO_INSTRUMENT_LOG_LEVEL`: log level
//! - `GO_INSTRUMENT_LOG_JSON`: JSON logging ("true" or "1")

pub mod loader;
pub mod merge;
pub mod schema;
pub mod types;
pub mod validation;
pub mod writer;

pub use loader::{LoadedConfig, load_merged};
pub use schema::schema_json_pretty;
pub use types::InstrumentConfig;
pub use validation::AdvisoryWarning;
pub use writer::write_config;
