use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resolves the per-line default count for a type.
pub trait DefaultResolver {
    fn per_line_default(&self, type_name: &str) -> u64;
}

impl<F> DefaultResolver for F
where
    F: Fn(&str) -> u64,
{
    fn per_line_default(&self, type_name: &str) -> u64 {
        self(type_name)
    }
}

/// Per-line default inputs: one global field plus optional per-type fields.
///
/// A per-type value wins over the global one, and 0 is used when neither
/// holds a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerLineDefaults {
    #[serde(default)]
    pub global: Option<u64>,
    #[serde(default)]
    pub per_type: BTreeMap<String, u64>,
}

impl PerLineDefaults {
    pub fn with_global(global: u64) -> Self {
        Self {
            global: Some(global),
            per_type: BTreeMap::new(),
        }
    }

    /// Update the global input from raw text; non-numeric text clears it.
    pub fn set_global_input(&mut self, raw: &str) {
        self.global = parse_count(raw);
    }

    /// Update a per-type input from raw text; non-numeric text clears it.
    pub fn set_type_input(&mut self, type_name: &str, raw: &str) {
        match parse_count(raw) {
            Some(value) => {
                self.per_type.insert(type_name.to_string(), value);
            }
            None => {
                self.per_type.remove(type_name);
            }
        }
    }

    pub fn resolve(&self, type_name: &str) -> u64 {
        self.per_type
            .get(type_name)
            .copied()
            .or(self.global)
            .unwrap_or(0)
    }
}

impl DefaultResolver for PerLineDefaults {
    fn per_line_default(&self, type_name: &str) -> u64 {
        self.resolve(type_name)
    }
}

/// Parse a count input: finite numbers only, negatives floor to 0 and
/// fractions round to the nearest integer.
pub fn parse_count(raw: &str) -> Option<u64> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.max(0.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_type_input_wins_over_global() {
        let mut defaults = PerLineDefaults::with_global(20);
        defaults.set_type_input("Cone", "35");
        assert_eq!(defaults.resolve("Cone"), 35);
        assert_eq!(defaults.resolve("Hex Interno"), 20);
    }

    #[test]
    fn missing_inputs_resolve_to_zero() {
        assert_eq!(PerLineDefaults::default().resolve("Cone"), 0);
    }

    #[test]
    fn non_numeric_input_falls_through_to_global() {
        let mut defaults = PerLineDefaults::with_global(12);
        defaults.set_type_input("Cone", "40");
        defaults.set_type_input("Cone", "lots");
        assert_eq!(defaults.resolve("Cone"), 12);
        defaults.set_global_input("");
        assert_eq!(defaults.resolve("Cone"), 0);
    }

    #[test]
    fn parse_count_normalizes_numbers() {
        assert_eq!(parse_count(" 7 "), Some(7));
        assert_eq!(parse_count("2.6"), Some(3));
        assert_eq!(parse_count("-4"), Some(0));
        assert_eq!(parse_count("inf"), None);
        assert_eq!(parse_count("NaN"), None);
    }

    #[test]
    fn closures_resolve_defaults() {
        let resolver = |name: &str| -> u64 { if name == "Cone" { 5 } else { 1 } };
        assert_eq!(resolver.per_line_default("Cone"), 5);
        assert_eq!(resolver.per_line_default("Other"), 1);
    }
}
