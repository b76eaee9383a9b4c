//! Application settings persisted as TOML in the app root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::Error as SerdeDeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::config::storage::atomic_write;
use crate::selection::registry::{JsonFileSource, Unconfigured};
use crate::selection::{PerLineDefaults, SplitGroups};
use crate::session::{SessionSnapshot, SharedSource};

/// Default filename used to store the app settings.
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("No suitable base config directory available for settings")]
    NoConfigDir,
    #[error("Unable to create settings directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid settings at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize settings to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// JSON file holding the line-count registry; unset uses the built-in one.
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
    /// Global per-line default applied in random mode.
    #[serde(default)]
    pub default_per_line: Option<u64>,
    /// Initial split percentages for a new session.
    #[serde(default)]
    pub splits: SplitGroups,
}

impl Settings {
    /// Replace split groups that are out of range with the defaults.
    pub fn normalized(mut self) -> Self {
        self.splits = self.splits.normalized();
        self
    }

    pub fn per_line_defaults(&self) -> PerLineDefaults {
        match self.default_per_line {
            Some(global) => PerLineDefaults::with_global(global),
            None => PerLineDefaults::default(),
        }
    }

    /// Fill the defaults and splits a session file left out.
    pub fn seed_snapshot(&self, mut snapshot: SessionSnapshot) -> SessionSnapshot {
        snapshot.splits.get_or_insert(self.splits);
        snapshot
            .defaults
            .get_or_insert_with(|| self.per_line_defaults());
        snapshot
    }

    pub fn registry_source(&self) -> SharedSource {
        match &self.registry_path {
            Some(path) => Arc::new(JsonFileSource::new(path.clone())),
            None => Arc::new(Unconfigured),
        }
    }
}

/// Resolve the settings file path, ensuring the parent directory exists.
pub fn settings_path() -> Result<PathBuf, SettingsError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(SETTINGS_FILE_NAME))
}

/// Load settings from the app root, returning defaults if missing.
pub fn load_or_default() -> Result<Settings, SettingsError> {
    load_from(&settings_path()?)
}

pub fn load_from(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let bytes = std::fs::read(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| SettingsError::ParseToml {
        path: path.to_path_buf(),
        source: SerdeDeError::custom(source),
    })?;
    toml::from_str(&text)
        .map_err(|source| SettingsError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
        .map(Settings::normalized)
}

/// Persist settings to the app root, overwriting any previous contents.
pub fn save(settings: &Settings) -> Result<(), SettingsError> {
    save_to_path(settings, &settings_path()?)
}

/// Save settings to a specific path, creating parent directories as needed.
pub fn save_to_path(settings: &Settings, path: &Path) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SettingsError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(settings).map_err(|source| SettingsError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, data.as_bytes()).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> SettingsError {
    match error {
        app_dirs::AppDirError::NoBaseDir => SettingsError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            SettingsError::CreateDir { path, source }
        }
    }
}
