//! Writing config files atomically.

use anyhow::{Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use std::io::Write;
use std::path::Path;

use crate::types::InstrumentConfig;

/// Write `config` as pretty JSON, creating parent directories.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn write_config(path: &Path, config: &InstrumentConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}\nUse --force to overwrite",
            path.display()
        );
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    json.push('\n');

    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(json.as_bytes()))
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "wrote config");
    Ok(())
}
