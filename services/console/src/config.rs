//! Console configuration
//!
//! Config precedence: CLI `--config` > `MEDTECH_CONFIG` env var > default
//! path. The login password is never stored in the TOML; it comes from the
//! `MEDTECH_PASSWORD` env var at login time.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Clinic API connection settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_secs: u64,
}

/// Where the session file lives between runs
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_dir")]
    pub dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: default_session_dir(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_refresh_timeout() -> u64 {
    30
}

fn default_session_dir() -> PathBuf {
    PathBuf::from(".medtech")
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.api.refresh_timeout_secs == 0 {
            return Err(common::Error::Config(
                "refresh_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve the config file path from CLI arg or MEDTECH_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("MEDTECH_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("medtech-console.toml")
    }

    /// Client settings derived from the `[api]` section.
    pub fn client_config(&self) -> medtech_client::ClientConfig {
        let mut client = medtech_client::ClientConfig::new(self.api.base_url.clone());
        client.request_timeout = Duration::from_secs(self.api.timeout_secs);
        client.refresh_timeout = Duration::from_secs(self.api.refresh_timeout_secs);
        client
    }
}
