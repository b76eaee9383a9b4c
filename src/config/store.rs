use super::defaults::{Config, DEFAULT_CONFIG_KEY, default_config};
use super::storage::{SaveOutcome, StorageTiers};
use crate::app_dirs::AppDirError;

/// Loads and persists the default training configuration.
///
/// The stored document is only trusted when it parses to an object carrying
/// at least the current schema version; anything else is replaced with the
/// built-in defaults, which are written back immediately.
pub struct ConfigStore {
    tiers: StorageTiers,
    key: String,
}

impl ConfigStore {
    pub fn new(tiers: StorageTiers) -> Self {
        Self {
            tiers,
            key: DEFAULT_CONFIG_KEY.to_string(),
        }
    }

    /// Store backed by the application storage directory.
    pub fn open_default() -> Result<Self, AppDirError> {
        Ok(Self::new(StorageTiers::open_default()?))
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self::new(StorageTiers::in_memory())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored configuration, or the built-in defaults when absent, malformed
    /// or outdated.
    pub fn load(&self) -> Config {
        let Some(raw) = self.tiers.read(&self.key) else {
            tracing::info!("No stored training configuration; using built-in defaults");
            return self.replace_with_default();
        };
        match Config::from_json(&raw) {
            Ok(config) if config.is_current() => config,
            Ok(config) => {
                tracing::info!(
                    stored_version = config.stored_version(),
                    "Stored training configuration is outdated; replacing with defaults"
                );
                self.replace_with_default()
            }
            Err(err) => {
                tracing::warn!("Stored training configuration unreadable ({err}); replacing");
                self.replace_with_default()
            }
        }
    }

    /// Stamp the current version on `config` and write it.
    pub fn save(&self, config: &mut Config) -> SaveOutcome {
        config.stamp_version();
        self.tiers.write(&self.key, &config.to_json())
    }

    /// Forget the stored configuration and write the defaults back.
    pub fn reset(&self) -> Config {
        self.tiers.remove(&self.key);
        tracing::info!("Training configuration reset to defaults");
        self.replace_with_default()
    }

    fn replace_with_default(&self) -> Config {
        let mut config = default_config();
        let outcome = self.save(&mut config);
        if !outcome.persisted() {
            tracing::warn!("Default training configuration could not be stored");
        }
        config
    }
}
