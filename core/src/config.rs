use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::metadata::DEFAULT_BASE_URL;
use crate::playback::PlaybackTimings;

const CONFIG_FILE: &str = "config.json";
pub const ENV_TMDB_API_KEY: &str = "TMDB_API_KEY";
pub const ENV_WALLET_RPC: &str = "BASESTREAM_WALLET_RPC";

/// User configuration, read from `config.json` in the platform config dir
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TMDB v3 API key
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    /// JSON-RPC endpoint of the wallet; no wallet when unset
    pub wallet_rpc: Option<String>,
    /// Catalog JSON file replacing the built-in list
    pub catalog_path: Option<PathBuf>,
    /// mpv executable
    pub mpv_path: String,
    pub autoplay_delay_ms: u64,
    pub hide_controls_ms: u64,
    /// Where the wallet flag is kept; platform data dir when unset
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_base_url: DEFAULT_BASE_URL.to_string(),
            wallet_rpc: None,
            catalog_path: None,
            mpv_path: "mpv".to_string(),
            autoplay_delay_ms: 1000,
            hide_controls_ms: 3000,
            data_dir: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "basestream")
}

impl Config {
    /// Platform location of the config file
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with overrides read through `lookup`
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_overrides(lookup);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply environment overrides; empty values are ignored
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty(ENV_TMDB_API_KEY) {
            self.tmdb_api_key = Some(key);
        }
        if let Some(rpc) = non_empty(ENV_WALLET_RPC) {
            self.wallet_rpc = Some(rpc);
        }
    }

    pub fn timings(&self) -> PlaybackTimings {
        PlaybackTimings {
            autoplay_delay: Duration::from_millis(self.autoplay_delay_ms),
            hide_controls_after: Duration::from_millis(self.hide_controls_ms),
        }
    }

    /// The configured catalog, or the built-in one
    pub fn catalog(&self) -> CoreResult<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::from_json_file(path),
            None => Ok(Catalog::public_domain()),
        }
    }

    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"tmdb_api_key": "abc", "autoplay_delay_ms": 250}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.tmdb_api_key.as_deref(), Some("abc"));
        assert_eq!(config.mpv_path, "mpv");
        assert_eq!(config.timings().autoplay_delay, Duration::from_millis(250));
        assert_eq!(config.timings().hide_controls_after, Duration::from_secs(3));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(Config::from_file(&path), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(ENV_TMDB_API_KEY, "from-env"), (ENV_WALLET_RPC, "  ")]
            .into_iter()
            .collect();
        let mut config = Config {
            wallet_rpc: Some("http://127.0.0.1:8545".into()),
            ..Config::default()
        };
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.tmdb_api_key.as_deref(), Some("from-env"));
        assert_eq!(config.wallet_rpc.as_deref(), Some("http://127.0.0.1:8545"));
    }

    #[test]
    fn test_load_applies_overrides_over_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"tmdb_api_key": "from-file", "mpv_path": "/opt/mpv"}"#).unwrap();
        let env: HashMap<&str, &str> = [(ENV_WALLET_RPC, "http://127.0.0.1:8545")].into_iter().collect();

        let config = Config::load_with(Some(&path), |key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.tmdb_api_key.as_deref(), Some("from-file"));
        assert_eq!(config.wallet_rpc.as_deref(), Some("http://127.0.0.1:8545"));
        assert_eq!(config.mpv_path, "/opt/mpv");
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            catalog_path: Some(dir.path().join("catalog.json")),
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_builtin_catalog_by_default() {
        assert_eq!(Config::default().catalog().unwrap().len(), 10);
    }
}
