//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod extract;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use billie_core::BillieConfig;

/// `<config_dir>/billie/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("billie")
        .join("config.json")
}

/// Load the config named on the command line, else the default file if it
/// exists, else built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<BillieConfig> {
    if let Some(path) = explicit {
        return BillieConfig::from_file(path)
            .with_context(|| format!("Failed to read config file {}", path.display()));
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config file {}", path.display());
        BillieConfig::from_file(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))
    } else {
        Ok(BillieConfig::default())
    }
}
