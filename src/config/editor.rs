use super::defaults::{Config, ConfigEditError};
use super::storage::SaveOutcome;
use super::store::ConfigStore;

/// Text buffer for hand-editing the configuration as JSON.
#[derive(Debug, Clone, Default)]
pub struct ConfigEditor {
    text: String,
    error: Option<String>,
}

impl ConfigEditor {
    /// Open the editor on a pretty-printed copy of `current`.
    pub fn open(current: &Config) -> Self {
        Self {
            text: current.to_pretty_json(),
            error: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.error = None;
    }

    /// Message from the last failed commit.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Buffer contents, when they currently parse to an object.
    pub fn pending(&self) -> Option<Config> {
        Config::from_json(&self.text).ok()
    }

    /// Merge the buffer into `current` and save the result.
    ///
    /// Invalid JSON leaves `current` and the stored copy untouched. When
    /// storage fails the merged config is still applied in memory.
    pub fn commit(
        &mut self,
        store: &ConfigStore,
        current: &mut Config,
    ) -> Result<SaveOutcome, ConfigEditError> {
        let parsed = match Config::from_json(&self.text) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.error = Some(err.to_string());
                return Err(err);
            }
        };
        let mut merged = current.clone();
        merged.merge(parsed);
        let outcome = store.save(&mut merged);
        *current = merged;
        self.error = None;
        if outcome.needs_warning() {
            tracing::warn!(?outcome, "Configuration applied but not saved persistently");
        } else {
            tracing::info!("Configuration saved");
        }
        Ok(outcome)
    }
}
