//! Training submission assembled from the selection and the config.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigEditor, ConfigStore};
use crate::selection::{DefaultResolver, SelectionMode, SelectionState, SplitGroups, SplitPercentages};

/// Line name used when a type is included without explicit rows.
pub const DEFAULT_LINE: &str = "default_line";

/// Requested images per line, per type.
pub type TypesToInclude = BTreeMap<String, BTreeMap<String, u64>>;

/// Free-form fields of the training form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingForm {
    #[serde(default)]
    pub dataset: String,
    /// Overrides the config `name` when set.
    #[serde(default)]
    pub exp_name: Option<String>,
    #[serde(default)]
    pub preprocessing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub train_percent: f64,
    pub val_percent: f64,
    pub test_percent: f64,
    pub types_to_include: TypesToInclude,
    pub random_split: SplitPercentages,
    pub preprocessing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPayload {
    pub dataset: String,
    pub exp_name: String,
    pub dataset_config: DatasetConfig,
    pub full_config: Config,
}

pub struct PayloadBuilder<'a> {
    form: &'a TrainingForm,
    state: &'a SelectionState,
    defaults: &'a dyn DefaultResolver,
    splits: &'a SplitGroups,
    editor: Option<&'a ConfigEditor>,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(
        form: &'a TrainingForm,
        state: &'a SelectionState,
        defaults: &'a dyn DefaultResolver,
        splits: &'a SplitGroups,
    ) -> Self {
        Self {
            form,
            state,
            defaults,
            splits,
            editor: None,
        }
    }

    /// Prefer the open editor buffer over the stored config when it parses.
    pub fn with_editor(mut self, editor: Option<&'a ConfigEditor>) -> Self {
        self.editor = editor;
        self
    }

    /// Build using the editor buffer, else the stored config.
    pub fn build(&self, store: &ConfigStore) -> TrainingPayload {
        let config = self
            .editor
            .and_then(ConfigEditor::pending)
            .unwrap_or_else(|| store.load());
        self.build_with_config(config)
    }

    pub fn build_with_config(&self, full_config: Config) -> TrainingPayload {
        let exp_name = self
            .form
            .exp_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or_else(|| full_config.name())
            .map(str::to_string)
            .unwrap_or_else(generated_exp_name);
        let positive = self.splits.positive;
        TrainingPayload {
            dataset: self.form.dataset.clone(),
            exp_name,
            dataset_config: DatasetConfig {
                train_percent: positive.train,
                val_percent: positive.val,
                test_percent: positive.test,
                types_to_include: types_to_include(self.state, self.defaults),
                random_split: self.splits.negative,
                preprocessing: self.form.preprocessing.clone(),
            },
            full_config,
        }
    }
}

/// Every enabled type: its contributing rows, or a single default line.
pub fn types_to_include(state: &SelectionState, defaults: &dyn DefaultResolver) -> TypesToInclude {
    state
        .iter()
        .filter(|(_, selection)| selection.enabled)
        .map(|(name, selection)| {
            let mut lines: BTreeMap<String, u64> = BTreeMap::new();
            if selection.mode == SelectionMode::Select {
                lines.extend(
                    selection
                        .contributing_rows()
                        .map(|row| (row.name.clone(), row.requested)),
                );
            }
            if lines.is_empty() {
                lines.insert(DEFAULT_LINE.to_string(), defaults.per_line_default(name));
            }
            (name.to_string(), lines)
        })
        .collect()
}

fn generated_exp_name() -> String {
    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("exp-{millis}")
}
