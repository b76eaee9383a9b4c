//! Per-type negative selection: enablement, mode and materialized line rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::defaults::DefaultResolver;
use super::registry::LineCountRegistry;

/// How a type draws its negative images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Every known line contributes up to the per-line default.
    #[default]
    Random,
    /// Only explicitly enabled lines contribute their requested count.
    Select,
}

impl SelectionMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Select => "select",
        }
    }
}

/// A line row materialized for select mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRow {
    pub name: String,
    pub available: u64,
    pub enabled: bool,
    /// Always within `0..=available`.
    pub requested: u64,
}

impl LineRow {
    pub fn contributes(&self) -> bool {
        self.enabled && self.requested > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSelection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub mode: SelectionMode,
    /// Empty until select mode has been opened for the type.
    #[serde(default)]
    pub lines: Vec<LineRow>,
}

impl TypeSelection {
    pub fn has_rows(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Rows that count toward totals in select mode.
    pub fn contributing_rows(&self) -> impl Iterator<Item = &LineRow> {
        self.lines.iter().filter(|row| row.contributes())
    }

    fn row_mut(&mut self, line: &str) -> Option<&mut LineRow> {
        self.lines.iter_mut().find(|row| row.name == line)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown implant type: {0}")]
    UnknownType(String),
    #[error("Type {type_name} has no line named {line}")]
    UnknownLine { type_name: String, line: String },
}

/// Selection for every type the panel knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState {
    types: BTreeMap<String, TypeSelection>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure every registry type has an entry (disabled, random) and
    /// line rows match the registry's current counts.
    pub fn sync_with_registry(&mut self, registry: &LineCountRegistry) {
        for name in registry.type_names() {
            self.types.entry(name.to_string()).or_default();
        }
        for (type_name, selection) in self.types.iter_mut().filter(|(_, sel)| sel.has_rows()) {
            let previous = std::mem::take(&mut selection.lines);
            selection.lines = registry
                .lines(type_name)
                .into_iter()
                .flatten()
                .map(|(name, &available)| {
                    match previous.iter().find(|row| &row.name == name) {
                        Some(row) => LineRow {
                            name: name.clone(),
                            available,
                            enabled: row.enabled,
                            requested: row.requested.min(available),
                        },
                        None => LineRow {
                            name: name.clone(),
                            available,
                            enabled: false,
                            requested: 0,
                        },
                    }
                })
                .collect();
            let dropped = previous
                .iter()
                .filter(|row| registry.available(type_name, &row.name).is_none())
                .count();
            if dropped > 0 {
                tracing::info!("Dropped {dropped} stale line rows for {type_name}");
            }
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeSelection> {
        self.types.get(type_name)
    }

    pub fn is_enabled(&self, type_name: &str) -> bool {
        self.types.get(type_name).is_some_and(|sel| sel.enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeSelection)> {
        self.types.iter().map(|(name, sel)| (name.as_str(), sel))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Enable or disable a type.
    ///
    /// Enabling a type in select mode seeds every row still at zero with
    /// `min(available, default)` and marks it enabled. Disabling leaves the
    /// rows untouched; the type flag alone removes the contribution, so the
    /// previous per-line choices come back on re-enable.
    pub fn set_type_enabled(
        &mut self,
        type_name: &str,
        enabled: bool,
        defaults: &dyn DefaultResolver,
    ) {
        let selection = self.types.entry(type_name.to_string()).or_default();
        selection.enabled = enabled;
        if !enabled || selection.mode != SelectionMode::Select {
            return;
        }
        let default = defaults.per_line_default(type_name);
        for row in selection.lines.iter_mut().filter(|row| row.requested == 0) {
            row.enabled = true;
            row.requested = default.min(row.available);
        }
    }

    /// Switch a type between random and select mode.
    ///
    /// Entering select mode rebuilds one row per registry line, seeded from
    /// the type's enablement before the switch, then enables the type.
    /// Leaving it keeps the rows around.
    pub fn set_type_mode(
        &mut self,
        type_name: &str,
        mode: SelectionMode,
        registry: &LineCountRegistry,
        defaults: &dyn DefaultResolver,
    ) {
        let selection = self.types.entry(type_name.to_string()).or_default();
        selection.mode = mode;
        if mode != SelectionMode::Select {
            return;
        }
        let type_enabled = selection.enabled;
        let default = defaults.per_line_default(type_name);
        selection.lines = registry
            .lines(type_name)
            .into_iter()
            .flatten()
            .map(|(name, &available)| LineRow {
                name: name.clone(),
                available,
                enabled: type_enabled,
                requested: if type_enabled {
                    available.min(default)
                } else {
                    0
                },
            })
            .collect();
        selection.enabled = true;
    }

    pub fn set_line_enabled(
        &mut self,
        type_name: &str,
        line: &str,
        enabled: bool,
    ) -> Result<(), SelectionError> {
        self.row_mut(type_name, line)?.enabled = enabled;
        Ok(())
    }

    /// Set a row's requested count, clamped to what the line has available.
    pub fn set_line_count(
        &mut self,
        type_name: &str,
        line: &str,
        count: u64,
    ) -> Result<u64, SelectionError> {
        let row = self.row_mut(type_name, line)?;
        row.requested = count.min(row.available);
        Ok(row.requested)
    }

    fn row_mut(&mut self, type_name: &str, line: &str) -> Result<&mut LineRow, SelectionError> {
        let selection = self
            .types
            .get_mut(type_name)
            .ok_or_else(|| SelectionError::UnknownType(type_name.to_string()))?;
        selection
            .row_mut(line)
            .ok_or_else(|| SelectionError::UnknownLine {
                type_name: type_name.to_string(),
                line: line.to_string(),
            })
    }
}
