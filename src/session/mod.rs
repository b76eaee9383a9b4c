//! One page activation worth of panel state, owned explicitly.
//!
//! `SessionContext` holds the registry snapshot, the selection, the per-line
//! defaults, both split groups and the training form. UI events go through
//! [`SessionContext::apply`], which recomputes the summary and notifies
//! listeners after every change.

pub mod listeners;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigEditor, ConfigStore};
use crate::payload::{PayloadBuilder, TrainingForm, TrainingPayload};
use crate::selection::{
    self, LineCountRegistry, PerLineDefaults, SelectionError, SelectionMode, SelectionState,
    SplitField, SplitGroup, SplitGroups, Summary,
};

pub use listeners::SummaryListeners;
pub use loader::{RegistryLoad, RegistryLoader, SharedSource};

/// A user interaction on the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SetTypeEnabled {
        type_name: String,
        enabled: bool,
    },
    SetTypeMode {
        type_name: String,
        mode: SelectionMode,
    },
    SetLineEnabled {
        type_name: String,
        line: String,
        enabled: bool,
    },
    SetLineCount {
        type_name: String,
        line: String,
        count: u64,
    },
    /// Raw text of the global per-line default input.
    SetGlobalDefault(String),
    /// Raw text of a per-type default input.
    SetTypeDefault {
        type_name: String,
        raw: String,
    },
    EditSplit {
        group: SplitGroup,
        field: SplitField,
        value: f64,
    },
    SetPositiveTotal(u64),
    SetDataset(String),
    SetExpName(Option<String>),
    SetPreprocessing(Vec<String>),
}

/// Serializable panel state, used to restore a session from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Registry to use; when absent the configured source is consulted.
    #[serde(default)]
    pub registry: Option<LineCountRegistry>,
    #[serde(default)]
    pub selection: SelectionState,
    /// Absent fields are seeded from settings, see `Settings::seed_snapshot`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<PerLineDefaults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splits: Option<SplitGroups>,
    #[serde(default)]
    pub positive_total: u64,
    #[serde(default)]
    pub form: TrainingForm,
}

pub struct SessionContext {
    registry: LineCountRegistry,
    selection: SelectionState,
    defaults: PerLineDefaults,
    splits: SplitGroups,
    positive_total: u64,
    form: TrainingForm,
    editor: Option<ConfigEditor>,
    summary: Summary,
    listeners: SummaryListeners,
}

impl SessionContext {
    pub fn new(splits: SplitGroups, defaults: PerLineDefaults) -> Self {
        let mut session = Self {
            registry: LineCountRegistry::default(),
            selection: SelectionState::new(),
            defaults,
            splits,
            positive_total: 0,
            form: TrainingForm::default(),
            editor: None,
            summary: Summary::default(),
            listeners: SummaryListeners::new(),
        };
        session.recompute();
        session
    }

    /// Restore a session. A snapshot without a registry activates an empty one.
    ///
    /// Stored rows are reconciled against the registry and out-of-range
    /// split groups fall back to the defaults.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        let splits = snapshot.splits.unwrap_or_default().normalized();
        let mut session = Self::new(splits, snapshot.defaults.unwrap_or_default());
        session.selection = snapshot.selection;
        session.positive_total = snapshot.positive_total;
        session.form = snapshot.form;
        session.activate(snapshot.registry.unwrap_or_default());
        session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            registry: Some(self.registry.clone()),
            selection: self.selection.clone(),
            defaults: Some(self.defaults.clone()),
            splits: Some(self.splits),
            positive_total: self.positive_total,
            form: self.form.clone(),
        }
    }

    /// Install a freshly loaded registry and recompute.
    pub fn activate(&mut self, registry: LineCountRegistry) {
        tracing::info!(types = registry.type_names().count(), "Registry activated");
        self.registry = registry;
        self.selection.sync_with_registry(&self.registry);
        self.recompute();
    }

    /// Apply one UI event and recompute the summary.
    ///
    /// Failed line edits leave the state unchanged and skip the recompute.
    pub fn apply(&mut self, event: SessionEvent) -> Result<&Summary, SelectionError> {
        match event {
            SessionEvent::SetTypeEnabled { type_name, enabled } => {
                self.selection
                    .set_type_enabled(&type_name, enabled, &self.defaults);
            }
            SessionEvent::SetTypeMode { type_name, mode } => {
                self.selection
                    .set_type_mode(&type_name, mode, &self.registry, &self.defaults);
            }
            SessionEvent::SetLineEnabled {
                type_name,
                line,
                enabled,
            } => self.selection.set_line_enabled(&type_name, &line, enabled)?,
            SessionEvent::SetLineCount {
                type_name,
                line,
                count,
            } => {
                self.selection.set_line_count(&type_name, &line, count)?;
            }
            SessionEvent::SetGlobalDefault(raw) => self.defaults.set_global_input(&raw),
            SessionEvent::SetTypeDefault { type_name, raw } => {
                self.defaults.set_type_input(&type_name, &raw)
            }
            SessionEvent::EditSplit {
                group,
                field,
                value,
            } => {
                self.splits.edit(group, field, value);
            }
            SessionEvent::SetPositiveTotal(total) => self.positive_total = total,
            SessionEvent::SetDataset(dataset) => self.form.dataset = dataset,
            SessionEvent::SetExpName(name) => self.form.exp_name = name,
            SessionEvent::SetPreprocessing(steps) => self.form.preprocessing = steps,
        }
        Ok(self.recompute())
    }

    /// Recompute the summary from the current state and notify listeners.
    pub fn recompute(&mut self) -> &Summary {
        self.summary = selection::compute(
            &self.registry,
            &self.selection,
            &self.defaults,
            self.positive_total,
            &self.splits,
        );
        self.listeners.notify(&self.summary);
        &self.summary
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn registry(&self) -> &LineCountRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn defaults(&self) -> &PerLineDefaults {
        &self.defaults
    }

    pub fn splits(&self) -> &SplitGroups {
        &self.splits
    }

    pub fn form(&self) -> &TrainingForm {
        &self.form
    }

    pub fn listeners_mut(&mut self) -> &mut SummaryListeners {
        &mut self.listeners
    }

    pub fn open_editor(&mut self, current: &Config) -> &mut ConfigEditor {
        self.editor.insert(ConfigEditor::open(current))
    }

    pub fn editor_mut(&mut self) -> Option<&mut ConfigEditor> {
        self.editor.as_mut()
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    /// Training payload for the current state; an open editor buffer that
    /// parses takes precedence over the stored config.
    pub fn build_payload(&self, store: &ConfigStore) -> TrainingPayload {
        PayloadBuilder::new(&self.form, &self.selection, &self.defaults, &self.splits)
            .with_editor(self.editor.as_ref())
            .build(store)
    }
}

#[cfg(test)]
mod tests;
