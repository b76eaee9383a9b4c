use crate::app_dirs::AppDirError;
use crate::config::{SaveOutcome, StorageTiers};

/// Storage key for the chosen model names.
pub const SELECTED_MODELS_KEY: &str = "selected_models";

/// Model names ticked on the prediction page, remembered across visits.
pub struct ModelSelection {
    tiers: StorageTiers,
}

impl ModelSelection {
    pub fn new(tiers: StorageTiers) -> Self {
        Self { tiers }
    }

    pub fn open_default() -> Result<Self, AppDirError> {
        Ok(Self::new(StorageTiers::open_default()?))
    }

    pub fn in_memory() -> Self {
        Self::new(StorageTiers::in_memory())
    }

    /// Stored names; a missing or corrupt entry reads as empty.
    pub fn load(&self) -> Vec<String> {
        let Some(raw) = self.tiers.read(SELECTED_MODELS_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str::<Option<Vec<String>>>(&raw) {
            Ok(models) => models.unwrap_or_default(),
            Err(err) => {
                tracing::warn!("Ignoring unreadable model selection: {err}");
                Vec::new()
            }
        }
    }

    pub fn save(&self, models: &[String]) -> SaveOutcome {
        match serde_json::to_string(models) {
            Ok(raw) => self.tiers.write(SELECTED_MODELS_KEY, &raw),
            Err(err) => {
                tracing::error!("Failed to encode model selection: {err}");
                SaveOutcome::Failed
            }
        }
    }

    /// Models to run: the ticked ones, else the remembered selection.
    pub fn resolve(&self, checked: &[String]) -> Vec<String> {
        if checked.is_empty() {
            self.load()
        } else {
            checked.to_vec()
        }
    }
}
