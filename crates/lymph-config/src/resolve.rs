//! Configuration resolution and path discovery.
//!
//! Resolution order: explicit path → environment variables → XDG path → defaults.

use std::path::{Path, PathBuf};

/// Where the configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided by the caller.
    Explicit,

    /// Set via environment variable.
    Environment,

    /// Found in the XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit => write!(f, "explicit path"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Outcome of path resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

pub const ENV_CONFIG_PATH: &str = "LYMPH_CONFIG";
pub const ENV_CONFIG_DIR: &str = "LYMPH_CONFIG_DIR";
pub const CONFIG_FILENAME: &str = "lymph.toml";
const APP_NAME: &str = "lymph";

/// Resolve the configuration file path.
///
/// 1. Explicit path (if it exists)
/// 2. `LYMPH_CONFIG`
/// 3. `LYMPH_CONFIG_DIR` + `lymph.toml`
/// 4. XDG config directory (`~/.config/lymph/lymph.toml`)
/// 5. Built-in defaults (no path)
pub fn resolve_config(explicit: Option<&Path>) -> ResolvedConfig {
    if let Some(path) = explicit {
        if path.exists() {
            return found(path.to_path_buf(), ConfigSource::Explicit);
        }
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::XdgConfig);
        }
    }

    ResolvedConfig::default()
}

fn found(path: PathBuf, source: ConfigSource) -> ResolvedConfig {
    ResolvedConfig {
        path: Some(path),
        source,
    }
}

/// XDG config directory for lymph.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}
