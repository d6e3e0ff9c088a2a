//! Global daybook configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{DaybookError, DaybookResult};
use crate::scheduler::SchedulerConfig;
use crate::source::Platform;

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_reset_to_today_secs() -> u64 {
    60
}

fn default_auto_reload_secs() -> u64 {
    30
}

fn default_tasks_reload_secs() -> u64 {
    60
}

/// Google Calendar settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GoogleConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    /// Defaults to `<config_dir>/daybook/google/token.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,
}

/// Global configuration at ~/.config/daybook/config.toml
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DaybookConfig {
    /// Overrides platform detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// IANA zone name. Falls back to the system zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    #[serde(default = "default_reset_to_today_secs")]
    pub reset_to_today_secs: u64,

    #[serde(default = "default_auto_reload_secs")]
    pub auto_reload_secs: u64,

    #[serde(default = "default_tasks_reload_secs")]
    pub tasks_reload_secs: u64,

    #[serde(default)]
    pub google: GoogleConfig,
}

impl Default for DaybookConfig {
    fn default() -> Self {
        DaybookConfig {
            platform: None,
            timezone: None,
            tick_interval_secs: default_tick_interval_secs(),
            reset_to_today_secs: default_reset_to_today_secs(),
            auto_reload_secs: default_auto_reload_secs(),
            tasks_reload_secs: default_tasks_reload_secs(),
            google: GoogleConfig::default(),
        }
    }
}

impl DaybookConfig {
    pub fn config_dir() -> DaybookResult<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| DaybookError::Config("Could not determine config directory".into()))?
            .join("daybook"))
    }

    pub fn config_path() -> DaybookResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the global config, writing a commented-out default on first run.
    pub fn load() -> DaybookResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> DaybookResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .map_err(|e| DaybookError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| DaybookError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> DaybookResult<()> {
        let contents = format!(
            "\
# daybook configuration

# Platform to behave as (web, android or ios). Detected when unset:
# platform = \"web\"

# Time zone used for \"today\" and midnight rollover:
# timezone = \"Europe/Paris\"

# Seconds between clock refreshes:
# tick_interval_secs = {}

# Seconds before an inspected day snaps back to today:
# reset_to_today_secs = {}

# Seconds between background calendar reloads:
# auto_reload_secs = {}

# Seconds between background reminder reloads:
# tasks_reload_secs = {}

# [google]
# api_base_url = \"https://www.googleapis.com/calendar/v3\"
# token_path = \"~/.config/daybook/google/token.json\"
",
            default_tick_interval_secs(),
            default_reset_to_today_secs(),
            default_auto_reload_secs(),
            default_tasks_reload_secs(),
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DaybookError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| DaybookError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn platform(&self) -> DaybookResult<Option<Platform>> {
        self.platform
            .as_deref()
            .map(|p| p.parse().map_err(DaybookError::Config))
            .transpose()
    }

    /// Configured zone, else the system zone, else UTC.
    pub fn timezone(&self) -> DaybookResult<Tz> {
        if let Some(name) = &self.timezone {
            return name
                .parse()
                .map_err(|_| DaybookError::Config(format!("Unknown time zone '{}'", name)));
        }

        match iana_time_zone::get_timezone() {
            Ok(name) => Ok(name.parse().unwrap_or_else(|_| {
                tracing::warn!(zone = %name, "system time zone not recognised, using UTC");
                Tz::UTC
            })),
            Err(e) => {
                tracing::warn!("could not detect system time zone, using UTC: {}", e);
                Ok(Tz::UTC)
            }
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval: Duration::from_secs(self.tick_interval_secs.max(1)),
            reset_to_today_after: Duration::from_secs(self.reset_to_today_secs),
            auto_reload_interval: Duration::from_secs(self.auto_reload_secs.max(1)),
        }
    }

    pub fn tasks_reload_interval(&self) -> Duration {
        Duration::from_secs(self.tasks_reload_secs.max(1))
    }

    /// Token file location with `~` expanded.
    pub fn google_token_path(&self) -> DaybookResult<PathBuf> {
        match &self.google.token_path {
            Some(path) => Ok(PathBuf::from(
                shellexpand::tilde(&path.to_string_lossy()).into_owned(),
            )),
            None => Ok(Self::config_dir()?.join("google").join("token.json")),
        }
    }
}
