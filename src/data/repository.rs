use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::warn;

use crate::error::StorageError;
use crate::signals::types::Signal;

/// Durable home for the signal collection.
pub trait SignalRepository: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Vec<Signal>>, StorageError>;
    fn save(&self, signals: &[Signal]) -> Result<(), StorageError>;
}

/// JSON file on local disk, replaced atomically on every save.
#[derive(Clone, Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep an unreadable file around instead of overwriting it on the next save.
    fn quarantine(&self) {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S")));
        let target = PathBuf::from(name);
        match std::fs::copy(&self.path, &target) {
            Ok(_) => warn!("📦 [STORE] Copied unreadable {} to {}", self.path.display(), target.display()),
            Err(e) => warn!("📦 [STORE] Could not back up unreadable {}: {}", self.path.display(), e),
        }
    }
}

impl SignalRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<Vec<Signal>>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        if content.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str(content) {
            Ok(signals) => Ok(Some(signals)),
            Err(e) => {
                self.quarantine();
                Err(e.into())
            }
        }
    }

    fn save(&self, signals: &[Signal]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, serde_json::to_vec_pretty(signals)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Process-local storage. Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryRepository {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a raw payload, e.g. to simulate corrupt storage.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SignalRepository for MemoryRepository {
    fn load(&self) -> Result<Option<Vec<Signal>>, StorageError> {
        match self.raw() {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, signals: &[Signal]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(signals)?;
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw);
        Ok(())
    }
}
