//! Subcommand implementations.

pub mod classify;
pub mod config;
pub mod parse;
pub mod run;

use std::path::{Path, PathBuf};

use sh01_core::Sh01Config;
use tracing::debug;

/// Default configuration file under the user config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sh01")
        .join("config.json")
}

/// Config file in effect: `--config` if given, else the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration, falling back to defaults when no file exists.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<Sh01Config> {
    let path = config_path(explicit);
    if explicit.is_some() || path.exists() {
        debug!("Loading config from {}", path.display());
        return Sh01Config::from_file(Path::new(&path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e));
    }
    Ok(Sh01Config::default())
}
