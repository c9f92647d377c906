use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::preview::{DateFormatter, Locale};
use crate::utils;

pub const DEFAULT_PROJECT_ID: &str = "mw7e9in4";
pub const DEFAULT_DATASET: &str = "production";
pub const DEFAULT_STUDIO_PORT: u16 = 3334;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown time zone: {0}")]
    TimeZone(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub project_id: String,
    pub dataset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
}

/// Settings the studio runtime reads when it is started locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    pub api: ApiConfig,
    pub server: ServerConfig,
    pub auto_updates: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                project_id: DEFAULT_PROJECT_ID.to_string(),
                dataset: DEFAULT_DATASET.to_string(),
            },
            server: ServerConfig {
                port: DEFAULT_STUDIO_PORT,
            },
            auto_updates: true,
        }
    }
}

impl CliConfig {
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(project_id) = std::env::var("SANITY_STUDIO_PROJECT_ID") {
            if !project_id.trim().is_empty() {
                self.api.project_id = project_id.trim().to_string();
            }
        }
        if let Ok(dataset) = std::env::var("SANITY_STUDIO_DATASET") {
            if !dataset.trim().is_empty() {
                self.api.dataset = dataset.trim().to_string();
            }
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub cli: CliConfig,
    pub api_token: Option<String>,
    pub display_timezone: Option<String>,
    pub locale: Option<String>,
}

impl AppConfig {
    /// The token for write calls; `SANITY_AUTH_TOKEN` wins over the stored one.
    pub fn token(&self) -> Option<String> {
        std::env::var("SANITY_AUTH_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| self.api_token.clone())
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        match self.display_timezone.as_deref() {
            None => Ok(Tz::UTC),
            Some(name) => parse_timezone(name),
        }
    }

    pub fn date_formatter(&self) -> Result<DateFormatter, ConfigError> {
        let locale = match self.locale.as_deref() {
            Some(tag) => Locale::parse(tag).unwrap_or_else(|| {
                warn!(locale = tag, "unsupported locale, falling back to en-US");
                Locale::default()
            }),
            None => Locale::default(),
        };
        Ok(DateFormatter::new(locale, self.timezone()?))
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::TimeZone(name.to_string()))
}

pub struct ConfigStore {
    path: PathBuf,
    data: Mutex<AppConfig>,
}

impl ConfigStore {
    pub fn load() -> Self {
        Self::load_from(utils::config_path())
    }

    pub fn load_from(path: PathBuf) -> Self {
        let data = match read_config(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), "ignoring unreadable config: {err}");
                AppConfig::default()
            }
        };
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> AppConfig {
        let mut config = self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        config.cli = config.cli.with_env_overrides();
        config
    }

    pub fn update<F>(&self, transform: F) -> Result<AppConfig, ConfigError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        transform(&mut guard);
        write_config(&self.path, &guard)?;
        debug!(path = %self.path.display(), "config written");
        Ok(guard.clone())
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn write_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    utils::ensure_parent(path)?;
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}
