//! User manager configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::admission::AdmissionConfig;
use crate::api::DEFAULT_BASE_URL;
use crate::dispatch::DispatchConfig;
use crate::domain::Credentials;

const PROJECT_CONFIG: &str = ".usermanager.yml";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API configuration
    pub api: ApiConfig,

    /// Admission queue (leaky bucket) limits
    pub admission: AdmissionConfig,

    /// Dispatch window limits
    pub dispatch: DispatchConfig,

    /// Parameter validation limits
    pub validation: ValidationConfig,

    /// Users requested per list page
    #[serde(rename = "page-size")]
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            admission: AdmissionConfig::default(),
            dispatch: DispatchConfig::default(),
            validation: ValidationConfig::default(),
            page_size: 10,
        }
    }
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config PATH`
    Explicit(PathBuf),
    /// `./.usermanager.yml`
    Project(PathBuf),
    /// `<config_dir>/usermanager/usermanager.yml`
    User(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Project(path) | ConfigSource::User(path) => Some(path),
            ConfigSource::Defaults => None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        Self::load_with_source(config_path).map(|(config, _)| config)
    }

    /// Load configuration and report which level of the fallback chain supplied it
    ///
    /// An explicit path must load. Project and user files are skipped with a
    /// warning when they cannot be read or parsed.
    pub fn load_with_source(config_path: Option<&PathBuf>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = config_path {
            let config =
                Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()))?;
            return Ok((config, ConfigSource::Explicit(path.clone())));
        }

        for source in Self::fallback_candidates() {
            let Some(path) = source.path() else {
                continue;
            };
            if !path.exists() {
                debug!(path = %path.display(), "Config::load_with_source: not present");
                continue;
            }
            match Self::load_from_file(path) {
                Ok(config) => {
                    info!(?source, "Loaded config");
                    return Ok((config, source));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unusable config file"),
            }
        }

        info!("No config file found, using defaults");
        Ok((Self::default(), ConfigSource::Defaults))
    }

    /// Implicit config locations, most specific first
    fn fallback_candidates() -> Vec<ConfigSource> {
        let mut candidates = vec![ConfigSource::Project(PathBuf::from(PROJECT_CONFIG))];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(ConfigSource::User(config_dir.join("usermanager").join("usermanager.yml")));
        }
        candidates
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        if config.admission.drain_rate == 0 || config.dispatch.limit_per_window == 0 {
            warn!(path = %path.display(), "Zero drain rate or window limit configured, 1 will be used");
        }
        Ok(config)
    }

    /// Resolve credentials from the configured application id and token env var
    pub fn credentials(&self) -> Result<Credentials> {
        let application_id = self
            .api
            .application_id
            .clone()
            .ok_or_else(|| eyre::eyre!("No application id configured. Set api.application-id."))?;
        let api_token = self.api.get_api_token()?;
        Ok(Credentials::new(application_id, api_token))
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; `{application_id}` is substituted per session
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Application to initialize the CLI session with
    #[serde(rename = "application-id")]
    pub application_id: Option<String>,

    /// Environment variable containing the API token
    #[serde(rename = "api-token-env")]
    pub api_token_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            application_id: None,
            api_token_env: "SENDBIRD_API_TOKEN".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Read the API token from the configured environment variable
    pub fn get_api_token(&self) -> Result<String> {
        std::env::var(&self.api_token_env).map_err(|_| {
            eyre::eyre!(
                "API token not found. Set the {} environment variable.",
                self.api_token_env
            )
        })
    }
}

/// Parameter validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    #[serde(rename = "max-user-id-len")]
    pub max_user_id_len: usize,

    #[serde(rename = "max-nickname-len")]
    pub max_nickname_len: usize,

    #[serde(rename = "max-profile-url-len")]
    pub max_profile_url_len: usize,

    /// Max users per batch create
    #[serde(rename = "max-batch-size")]
    pub max_batch_size: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_user_id_len: 80,
            max_nickname_len: 80,
            max_profile_url_len: 2048,
            max_batch_size: 10,
        }
    }
}
