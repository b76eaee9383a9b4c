//! Pure derivation of the negative-selection summary and split counts.

use std::collections::BTreeSet;

use serde::Serialize;

use super::defaults::DefaultResolver;
use super::registry::LineCountRegistry;
use super::split::{SplitGroups, SplitPercentages};
use super::state::{SelectionMode, SelectionState, TypeSelection};

/// Image counts per split. Signed because `test` absorbs rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SplitCounts {
    pub train: i64,
    pub val: i64,
    pub test: i64,
}

impl SplitCounts {
    /// Split `total` by percentage; `test` takes whatever rounding left over.
    pub fn from_percentages(total: u64, split: &SplitPercentages) -> Self {
        let total = i64::try_from(total).unwrap_or(i64::MAX);
        let train = percent_of(total, split.train);
        let val = percent_of(total, split.val);
        Self {
            train,
            val,
            test: total.saturating_sub(train).saturating_sub(val),
        }
    }

    pub fn total(&self) -> i64 {
        self.train.saturating_add(self.val).saturating_add(self.test)
    }
}

impl std::ops::Add for SplitCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            train: self.train.saturating_add(rhs.train),
            val: self.val.saturating_add(rhs.val),
            test: self.test.saturating_add(rhs.test),
        }
    }
}

impl std::fmt::Display for SplitCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {} / {}", self.train, self.val, self.test)
    }
}

fn percent_of(total: i64, percent: f64) -> i64 {
    let percent = if percent.is_finite() { percent } else { 0.0 };
    ((total as f64) * percent / 100.0).round() as i64
}

/// Per-type row of the summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub name: String,
    pub enabled: bool,
    pub mode: SelectionMode,
    /// Lines selected when enabled; all known lines when disabled.
    pub lines_count: usize,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub types: Vec<TypeSummary>,
    pub total_positives: u64,
    pub total_negatives: u64,
    pub total_all: u64,
    pub positive_split: SplitCounts,
    pub negative_split: SplitCounts,
    pub combined_split: SplitCounts,
}

impl Summary {
    pub fn type_summary(&self, name: &str) -> Option<&TypeSummary> {
        self.types.iter().find(|row| row.name == name)
    }
}

/// Compute the summary for the current selection.
///
/// Types are the union of the registry and the selection state, in name
/// order. Calling this twice with the same inputs yields the same result.
pub fn compute(
    registry: &LineCountRegistry,
    state: &SelectionState,
    defaults: &dyn DefaultResolver,
    positive_total: u64,
    splits: &SplitGroups,
) -> Summary {
    let names: BTreeSet<&str> = registry.type_names().chain(state.type_names()).collect();
    let fallback = TypeSelection::default();
    let types: Vec<TypeSummary> = names
        .into_iter()
        .map(|name| {
            let selection = state.get(name).unwrap_or(&fallback);
            summarize_type(name, selection, registry, defaults)
        })
        .collect();

    let total_negatives = types
        .iter()
        .fold(0u64, |sum, row| sum.saturating_add(row.total));
    let positive_split = SplitCounts::from_percentages(positive_total, &splits.positive);
    let negative_split = SplitCounts::from_percentages(total_negatives, &splits.negative);
    Summary {
        types,
        total_positives: positive_total,
        total_negatives,
        total_all: positive_total.saturating_add(total_negatives),
        positive_split,
        negative_split,
        combined_split: positive_split + negative_split,
    }
}

fn summarize_type(
    name: &str,
    selection: &TypeSelection,
    registry: &LineCountRegistry,
    defaults: &dyn DefaultResolver,
) -> TypeSummary {
    let known_lines = registry.line_count(name);
    let (lines_count, total) = if !selection.enabled {
        (known_lines, 0)
    } else if selection.mode == SelectionMode::Select && selection.has_rows() {
        selection
            .contributing_rows()
            .fold((0, 0u64), |(count, sum), row| {
                (count + 1, sum.saturating_add(row.requested))
            })
    } else {
        random_contribution(name, registry, defaults.per_line_default(name))
    };
    TypeSummary {
        name: name.to_string(),
        enabled: selection.enabled,
        mode: selection.mode,
        lines_count,
        total,
    }
}

fn random_contribution(name: &str, registry: &LineCountRegistry, per_line: u64) -> (usize, u64) {
    let Some(lines) = registry.lines(name).filter(|lines| !lines.is_empty()) else {
        // No known lines: treat the type as a single implicit line.
        return (1, per_line);
    };
    let total = lines
        .values()
        .map(|&available| {
            if per_line > 0 {
                per_line.min(available)
            } else {
                available
            }
        })
        .fold(0u64, u64::saturating_add);
    (lines.len(), total)
}
