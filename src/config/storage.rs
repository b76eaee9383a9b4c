//! Two-tier key-value storage: a persistent tier and a session-scoped one.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::app_dirs;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to read a stored value.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write a stored value.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to delete a stored value.
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The tier cannot be used right now (quota, permissions, poisoned lock).
    #[error("Storage tier unavailable: {0}")]
    Unavailable(String),
}

/// A place string values can be kept under a key.
pub trait StorageTier: Send + Sync {
    fn label(&self) -> &'static str;
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Persistent tier: one JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileTier {
    dir: PathBuf,
}

impl FileTier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File tier rooted in the application storage directory.
    pub fn in_app_dir() -> Result<Self, app_dirs::AppDirError> {
        Ok(Self::new(app_dirs::storage_dir()?))
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_stem}.json"))
    }
}

impl StorageTier for FileTier {
    fn label(&self) -> &'static str {
        "file"
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::Write {
            path: self.dir.clone(),
            source,
        })?;
        atomic_write(&path, value.as_bytes()).map_err(|source| StorageError::Write { path, source })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Remove { path, source }),
        }
    }
}

/// Session tier: values live only as long as the process.
#[derive(Debug, Default)]
pub struct SessionTier {
    values: Mutex<HashMap<String, String>>,
}

impl SessionTier {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Unavailable("session store lock poisoned".into()))
    }
}

impl StorageTier for SessionTier {
    fn label(&self) -> &'static str {
        "session"
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values()?.remove(key);
        Ok(())
    }
}

/// Where a write ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Stored in the persistent tier.
    Primary,
    /// Persistent tier failed; stored for this session only.
    Session,
    /// Neither tier accepted the value.
    Failed,
}

impl SaveOutcome {
    pub fn persisted(self) -> bool {
        !matches!(self, Self::Failed)
    }

    /// True when the value will not survive a restart.
    pub fn needs_warning(self) -> bool {
        !matches!(self, Self::Primary)
    }
}

/// A persistent tier backed by a session tier.
pub struct StorageTiers {
    primary: Box<dyn StorageTier>,
    session: Box<dyn StorageTier>,
}

impl StorageTiers {
    pub fn new(primary: Box<dyn StorageTier>, session: Box<dyn StorageTier>) -> Self {
        Self { primary, session }
    }

    /// File tier in the app directory plus an in-memory session tier.
    pub fn open_default() -> Result<Self, app_dirs::AppDirError> {
        Ok(Self::new(
            Box::new(FileTier::in_app_dir()?),
            Box::new(SessionTier::new()),
        ))
    }

    /// Both tiers in memory; nothing touches disk.
    pub fn in_memory() -> Self {
        Self::new(Box::new(SessionTier::new()), Box::new(SessionTier::new()))
    }

    /// Read from the persistent tier, then the session tier.
    pub fn read(&self, key: &str) -> Option<String> {
        match self.primary.read(key) {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(err) => tracing::warn!(tier = self.primary.label(), "Storage read failed: {err}"),
        }
        match self.session.read(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(tier = self.session.label(), "Storage read failed: {err}");
                None
            }
        }
    }

    /// Write to the persistent tier, falling back to the session tier.
    ///
    /// A successful persistent write clears any stale session copy.
    pub fn write(&self, key: &str, value: &str) -> SaveOutcome {
        let primary_err = match self.primary.write(key, value) {
            Ok(()) => {
                if let Err(err) = self.session.remove(key) {
                    tracing::debug!("Failed to clear session copy of {key}: {err}");
                }
                return SaveOutcome::Primary;
            }
            Err(err) => err,
        };
        match self.session.write(key, value) {
            Ok(()) => {
                tracing::warn!(
                    "Persistent storage unavailable ({primary_err}); {key} saved for this session only"
                );
                SaveOutcome::Session
            }
            Err(err) => {
                tracing::error!("Failed to store {key}: {primary_err}; session fallback: {err}");
                SaveOutcome::Failed
            }
        }
    }

    /// Drop the key from both tiers.
    pub fn remove(&self, key: &str) {
        for tier in [&self.primary, &self.session] {
            if let Err(err) = tier.remove(key) {
                tracing::warn!(tier = tier.label(), "Failed to remove {key}: {err}");
            }
        }
    }
}

/// Write a file atomically so a crash never leaves a half-written value.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use rand::TryRngCore;
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::other("path has no parent directory"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::other("path has no file name"))?;

    let mut last_err = None;
    for _ in 0..5 {
        let mut bytes = [0u8; 6];
        rand::rngs::OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| std::io::Error::other(format!("failed to generate temp suffix: {err}")))?;
        let suffix: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let tmp_path = dir.join(format!("{}.tmp-{suffix}", file_name.to_string_lossy()));

        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                last_err = Some(err);
                continue;
            }
            Err(err) => return Err(err),
        };

        let written = file.write_all(data).and_then(|()| file.sync_all());
        drop(file);
        if let Err(err) = written.and_then(|()| std::fs::rename(&tmp_path, path)) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err);
        }
        return Ok(());
    }

    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("failed to create temporary file for {}", path.display()),
        )
    }))
}
