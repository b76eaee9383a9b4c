//! Train/val/test percentage groups and the at-most-100 rule.

use serde::{Deserialize, Serialize};

const MAX_TOTAL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitField {
    Train,
    Val,
    Test,
}

/// One train/val/test percentage group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitPercentages {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitPercentages {
    fn default() -> Self {
        Self::new(70.0, 20.0, 10.0)
    }
}

impl SplitPercentages {
    pub const fn new(train: f64, val: f64, test: f64) -> Self {
        Self { train, val, test }
    }

    pub fn get(&self, field: SplitField) -> f64 {
        match field {
            SplitField::Train => self.train,
            SplitField::Val => self.val,
            SplitField::Test => self.test,
        }
    }

    fn slot(&mut self, field: SplitField) -> &mut f64 {
        match field {
            SplitField::Train => &mut self.train,
            SplitField::Val => &mut self.val,
            SplitField::Test => &mut self.test,
        }
    }

    /// Every field is a finite share of at least zero and the group fits in 100.
    pub fn is_valid(&self) -> bool {
        [self.train, self.val, self.test]
            .iter()
            .all(|value| value.is_finite() && *value >= 0.0)
            && self.sum() <= MAX_TOTAL
    }

    pub fn sum(&self) -> f64 {
        finite_or_zero(self.train) + finite_or_zero(self.val) + finite_or_zero(self.test)
    }

    /// Apply a user edit to one field and keep the group within 100.
    ///
    /// Returns the value the field ends up with.
    pub fn edit(&mut self, field: SplitField, value: f64) -> f64 {
        *self.slot(field) = finite_or_zero(value).max(0.0);
        self.enforce(field);
        self.get(field)
    }

    /// Reduce `changed` by the overflow when the group sums past 100.
    ///
    /// Returns the adjusted value, or `None` when no clamp was needed.
    pub fn enforce(&mut self, changed: SplitField) -> Option<f64> {
        let total = self.sum();
        if total <= MAX_TOTAL {
            return None;
        }
        let current = finite_or_zero(self.get(changed));
        let others = total - current;
        let excess = total - MAX_TOTAL;
        let mut adjusted = (current - excess).round().max(0.0);
        if others + adjusted > MAX_TOTAL {
            adjusted = (MAX_TOTAL - others).floor().max(0.0);
        }
        *self.slot(changed) = adjusted;
        tracing::info!(
            field = ?changed,
            from = current,
            to = adjusted,
            "Split percentages exceeded 100%; adjusted edited field"
        );
        Some(adjusted)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Which percentage group an edit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitGroup {
    Positive,
    Negative,
}

/// The positive split and the negative (random) split, constrained separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitGroups {
    #[serde(default)]
    pub positive: SplitPercentages,
    #[serde(default)]
    pub negative: SplitPercentages,
}

impl SplitGroups {
    pub fn group(&self, group: SplitGroup) -> &SplitPercentages {
        match group {
            SplitGroup::Positive => &self.positive,
            SplitGroup::Negative => &self.negative,
        }
    }

    pub fn edit(&mut self, group: SplitGroup, field: SplitField, value: f64) -> f64 {
        match group {
            SplitGroup::Positive => self.positive.edit(field, value),
            SplitGroup::Negative => self.negative.edit(field, value),
        }
    }

    /// Replace any group that is out of range with the default split.
    pub fn normalized(mut self) -> Self {
        for (label, group) in [
            ("positive", &mut self.positive),
            ("negative", &mut self.negative),
        ] {
            if !group.is_valid() {
                tracing::warn!(
                    "Ignoring {label} split {}/{}/{}: values must be non-negative and sum to at most 100",
                    group.train,
                    group.val,
                    group.test
                );
                *group = SplitPercentages::default();
            }
        }
        self
    }
}
