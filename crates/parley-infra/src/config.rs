//! Global configuration loader for Parley.
//!
//! Reads `config.toml` (from the data directory, `~/.parley/` by default, or an
//! explicit path) and deserializes it into [`GlobalConfig`]. Falls back to
//! defaults when the file is missing or malformed, then applies environment
//! overrides.

use std::path::Path;

use parley_types::config::GlobalConfig;

use crate::sqlite::pool::default_database_url;

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(path: &Path) -> GlobalConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            GlobalConfig::default()
        }
    }
}

/// Apply `PARLEY_DATABASE_URL`, `OLLAMA_BASE_URL` and `PARLEY_MODEL`
/// on top of a loaded config.
pub fn apply_env_overrides(config: &mut GlobalConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides(config: &mut GlobalConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("PARLEY_DATABASE_URL") {
        config.database.url = Some(url);
    }
    if let Some(base_url) = lookup("OLLAMA_BASE_URL") {
        config.model.base_url = base_url;
    }
    if let Some(model) = lookup("PARLEY_MODEL") {
        config.model.model = model;
    }
}

/// The database URL to open: the configured one, or the data-dir default.
pub fn resolve_database_url(config: &GlobalConfig) -> String {
    config
        .database
        .url
        .clone()
        .unwrap_or_else(default_database_url)
}
