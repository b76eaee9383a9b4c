//! Default training configuration: built-in document, two-tier storage,
//! versioned load/save and the JSON editor.

mod defaults;
mod editor;
pub(crate) mod storage;
mod store;

#[cfg(test)]
mod tests;

pub use defaults::{
    Config, ConfigEditError, DEFAULT_CONFIG_KEY, DEFAULT_CONFIG_VERSION, VERSION_FIELD,
    default_config,
};
pub use editor::ConfigEditor;
pub use storage::{FileTier, SaveOutcome, SessionTier, StorageError, StorageTier, StorageTiers};
pub use store::ConfigStore;
