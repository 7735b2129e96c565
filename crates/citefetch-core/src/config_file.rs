//! On-disk TOML configuration.
//!
//! All fields are optional so partial configs work (merge with defaults).
//! A `.citefetch.toml` in the working directory overlays the platform
//! config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Config;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api_keys: Option<ApiKeysConfig>,
    pub network: Option<NetworkConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    pub s2_api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub timeout_secs: Option<u64>,
    pub max_concurrent_fetches: Option<usize>,
}

/// Platform config directory path: `<config_dir>/citefetch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("citefetch").join("config.toml"))
}

/// Load config by cascading CWD `.citefetch.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".citefetch.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        api_keys: Some(ApiKeysConfig {
            s2_api_key: overlay
                .api_keys
                .as_ref()
                .and_then(|a| a.s2_api_key.clone())
                .or_else(|| base.api_keys.as_ref().and_then(|a| a.s2_api_key.clone())),
        }),
        network: Some(NetworkConfig {
            timeout_secs: overlay
                .network
                .as_ref()
                .and_then(|n| n.timeout_secs)
                .or_else(|| base.network.as_ref().and_then(|n| n.timeout_secs)),
            max_concurrent_fetches: overlay
                .network
                .as_ref()
                .and_then(|n| n.max_concurrent_fetches)
                .or_else(|| base.network.as_ref().and_then(|n| n.max_concurrent_fetches)),
        }),
    }
}

impl ConfigFile {
    /// Effective runtime [`Config`], with defaults for anything unset.
    pub fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            s2_api_key: self.api_keys.and_then(|a| a.s2_api_key),
            http_timeout_secs: self
                .network
                .as_ref()
                .and_then(|n| n.timeout_secs)
                .unwrap_or(defaults.http_timeout_secs),
            max_concurrent_fetches: self
                .network
                .as_ref()
                .and_then(|n| n.max_concurrent_fetches)
                .unwrap_or(defaults.max_concurrent_fetches),
        }
    }
}
