//! Snapshot of available negative images per implant type and line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Available image count per line name.
pub type LineCounts = BTreeMap<String, u64>;

/// Immutable per-activation mapping of type name to its known lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineCountRegistry {
    types: BTreeMap<String, LineCounts>,
}

impl LineCountRegistry {
    pub fn new(types: BTreeMap<String, LineCounts>) -> Self {
        Self { types }
    }

    /// Static data used when no line-count source is wired up.
    pub fn fallback() -> Self {
        let mut types = BTreeMap::new();
        types.insert(
            "Cone".to_string(),
            lines(&[
                ("CONEXAO-FLASH", 500),
                ("CONEXAO-A", 450),
                ("CONEXAO-B", 300),
                ("CONEXAO-C", 600),
            ]),
        );
        types.insert(
            "Hex Externo".to_string(),
            lines(&[
                ("INTRAOSS-EXTRACT", 800),
                ("EXTRACT-HE-B", 750),
                ("EXTRACT-HE-C", 600),
            ]),
        );
        types.insert(
            "Hex Interno".to_string(),
            lines(&[("MEDENS_COLOSSO", 400)]),
        );
        Self { types }
    }

    /// Parse the `{type: {line: count}}` document; `null` reads as empty.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let parsed: Option<BTreeMap<String, LineCounts>> = serde_json::from_str(text)?;
        Ok(Self::new(parsed.unwrap_or_default()))
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Lines known for a type, if the type exists.
    pub fn lines(&self, type_name: &str) -> Option<&LineCounts> {
        self.types.get(type_name)
    }

    /// Number of known lines for a type (0 for unknown types).
    pub fn line_count(&self, type_name: &str) -> usize {
        self.types.get(type_name).map_or(0, BTreeMap::len)
    }

    pub fn available(&self, type_name: &str, line: &str) -> Option<u64> {
        self.types.get(type_name)?.get(line).copied()
    }
}

fn lines(entries: &[(&str, u64)]) -> LineCounts {
    entries
        .iter()
        .map(|(name, count)| (name.to_string(), *count))
        .collect()
}

/// Errors raised by a line-count source.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Reading the backing data failed.
    #[error("Failed to read line counts from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The payload was not a `{type: {line: count}}` document.
    #[error("Invalid line counts from {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },
    /// The source reported a failure of its own.
    #[error("Line count source failed: {0}")]
    Source(String),
}

/// External supplier of the line-count registry.
///
/// `Ok(None)` means the source is not available at all, which makes the
/// loader substitute [`LineCountRegistry::fallback`].
pub trait LineCountSource {
    fn fetch(&self) -> Result<Option<LineCountRegistry>, RegistryError>;
}

/// Source used when nothing is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl LineCountSource for Unconfigured {
    fn fetch(&self) -> Result<Option<LineCountRegistry>, RegistryError> {
        Ok(None)
    }
}

/// Source that always returns the same registry.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub LineCountRegistry);

impl LineCountSource for StaticSource {
    fn fetch(&self) -> Result<Option<LineCountRegistry>, RegistryError> {
        Ok(Some(self.0.clone()))
    }
}

/// Source reading the JSON document from disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineCountSource for JsonFileSource {
    fn fetch(&self) -> Result<Option<LineCountRegistry>, RegistryError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| RegistryError::Read {
            path: self.path.clone(),
            source,
        })?;
        LineCountRegistry::from_json(&text)
            .map(Some)
            .map_err(|source| RegistryError::Parse {
                origin: self.path.display().to_string(),
                source,
            })
    }
}

/// Load the registry, never failing.
///
/// An absent source yields the fallback data; a failing source yields an
/// empty registry and a logged error.
pub fn load(source: &dyn LineCountSource) -> LineCountRegistry {
    match source.fetch() {
        Ok(Some(registry)) => {
            tracing::debug!(types = registry.types.len(), "Loaded negative line counts");
            registry
        }
        Ok(None) => {
            tracing::warn!("No line count source configured; using fallback line counts");
            LineCountRegistry::fallback()
        }
        Err(err) => {
            tracing::error!("Failed to load negative line counts: {err}");
            LineCountRegistry::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct Failing;

    impl LineCountSource for Failing {
        fn fetch(&self) -> Result<Option<LineCountRegistry>, RegistryError> {
            Err(RegistryError::Source("HTTP 503".into()))
        }
    }

    #[test]
    fn absent_source_uses_fallback_literal() {
        let registry = load(&Unconfigured);
        assert_eq!(registry.type_names().collect::<Vec<_>>(), [
            "Cone",
            "Hex Externo",
            "Hex Interno"
        ]);
        assert_eq!(registry.available("Cone", "CONEXAO-C"), Some(600));
        assert_eq!(registry.available("Hex Externo", "EXTRACT-HE-B"), Some(750));
        assert_eq!(registry.line_count("Hex Interno"), 1);
    }

    #[test]
    fn failing_source_yields_empty_registry() {
        assert!(load(&Failing).is_empty());
    }

    #[test]
    fn json_null_reads_as_empty() {
        assert!(LineCountRegistry::from_json("null").unwrap().is_empty());
    }

    #[test]
    fn file_source_reads_mapping() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counts.json");
        std::fs::write(&path, r#"{"Cone": {"A": 100, "B": 50}}"#).unwrap();
        let registry = load(&JsonFileSource::new(&path));
        assert_eq!(registry.line_count("Cone"), 2);
        assert_eq!(registry.available("Cone", "B"), Some(50));
    }

    #[test]
    fn unreadable_or_invalid_file_fails_open() {
        let dir = tempdir().unwrap();
        assert!(load(&JsonFileSource::new(dir.path().join("missing.json"))).is_empty());
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"Cone": {"A": -3}}"#).unwrap();
        assert!(load(&JsonFileSource::new(&path)).is_empty());
    }
}
