// Procstat -- per-process telemetry agent for Linux
// Copyright (C) 2026  Procstat authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use getset::Getters;
use log::warn;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Reporting intervals below this floor are clamped up.
pub const MIN_DURATION_SECONDS: u64 = 60;

const CONFIG_BASENAME: &str = "config.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("no configuration file found, looked for {0} in XDG config directories")]
    NotFound(String),
    #[error("{0}: cannot read configuration: {1}")]
    Unreadable(PathBuf, std::io::Error),
    #[error("{0}: {1}")]
    Invalid(PathBuf, toml::de::Error),
    #[error("the process list must not be empty")]
    NoProcesses,
    #[error("the license key must not be empty")]
    NoLicense,
    #[error("the reporting duration must be positive")]
    ZeroDuration,
}

fn default_duration() -> u64 {
    MIN_DURATION_SECONDS
}

fn default_endpoint() -> String {
    String::from("https://platform-api.newrelic.com/platform/v1/metrics")
}

fn default_guid() -> String {
    String::from("com.az.procs.procstats")
}

/// The `[general]` section.
#[derive(Debug, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct GeneralSettings {
    /// Credential sent with every submission.
    license: String,
    /// Reporting interval in seconds.
    #[serde(default = "default_duration")]
    #[getset(skip)]
    duration: u64,
    /// Ingestion endpoint URL.
    #[serde(default = "default_endpoint")]
    endpoint: String,
    /// Application identifier reported with every component.
    #[serde(default = "default_guid")]
    guid: String,
}

/// Validated agent settings.
#[derive(Debug, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct Settings {
    general: GeneralSettings,
    /// Names of the processes to watch, matched exactly.
    process: Vec<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Unreadable(path.to_path_buf(), err))?;
        let settings = toml::from_str::<Settings>(&content)
            .map_err(|err| ConfigError::Invalid(path.to_path_buf(), err))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load the first `config.toml` found in the XDG config directories.
    pub fn discover(app_name: &str) -> Result<Settings, ConfigError> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix(app_name);
        match xdg_dirs.find_config_file(CONFIG_BASENAME) {
            Some(path) => Settings::load(&path),
            None => Err(ConfigError::NotFound(format!(
                "{app_name}/{CONFIG_BASENAME}"
            ))),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.process.is_empty() {
            return Err(ConfigError::NoProcesses);
        }
        if self.general.license.is_empty() {
            return Err(ConfigError::NoLicense);
        }
        if self.general.duration == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        Ok(())
    }

    /// Configured reporting interval with the floor applied.
    pub fn effective_duration(&self) -> u64 {
        if self.general.duration < MIN_DURATION_SECONDS {
            warn!(
                "duration of {} seconds is below the floor, using {}",
                self.general.duration, MIN_DURATION_SECONDS
            );
            MIN_DURATION_SECONDS
        } else {
            self.general.duration
        }
    }

    /// Configured process names as a set for exact-match location.
    pub fn process_names(&self) -> HashSet<String> {
        self.process.iter().cloned().collect()
    }
}
