//! Local file backend for state storage
//!
//! The state lives in a JSON file (default: baas.state.json) and is written
//! through a temporary file that replaces it. A sibling `.lock` file guards
//! concurrent commands; it is written in full to a temporary file first and
//! then hard-linked into place, so a reader never sees a partial lock.

use async_trait::async_trait;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::backend::{BackendConfig, BackendError, BackendResult, StateBackend};
use crate::lock::LockInfo;
use crate::state::StateFile;

pub struct LocalBackend {
    state_path: PathBuf,
    lock_path: PathBuf,
}

impl LocalBackend {
    pub const DEFAULT_STATE_FILE: &'static str = "baas.state.json";

    pub fn new() -> Self {
        Self::with_path(PathBuf::from(Self::DEFAULT_STATE_FILE))
    }

    pub fn with_path(state_path: PathBuf) -> Self {
        let lock_path = state_path.with_extension("lock");
        Self {
            state_path,
            lock_path,
        }
    }

    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        match config.get_string("path") {
            Some("") => Err(BackendError::configuration("path must not be empty")),
            Some(path) => Ok(Self::with_path(PathBuf::from(path))),
            None => Ok(Self::new()),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    fn read_lock(&self) -> BackendResult<Option<LockInfo>> {
        let content = match fs::read_to_string(&self.lock_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Io(format!("Failed to read lock file: {}", e))),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| BackendError::InvalidState(format!("Failed to parse lock file: {}", e)))
    }

    /// Remove a lock file nobody can be holding: expired, or unreadable
    fn clear_abandoned_lock(&self) -> BackendResult<()> {
        match self.read_lock() {
            Ok(None) => return Ok(()),
            Ok(Some(existing)) if !existing.is_expired() => {
                return Err(BackendError::Locked(existing));
            }
            Ok(Some(existing)) => log::warn!("Taking over expired lock {}", existing),
            Err(BackendError::InvalidState(reason)) => log::warn!(
                "Taking over unreadable lock {}: {}",
                self.lock_path.display(),
                reason
            ),
            Err(e) => return Err(e),
        }

        match fs::remove_file(&self.lock_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::Io(format!("Failed to remove lock file: {}", e))),
        }
    }

    /// Publish `content` as the lock file unless one already exists
    fn create_lock_file(&self, lock: &LockInfo, content: &str) -> BackendResult<bool> {
        let tmp_path = self.lock_path.with_extension(format!("lock.{}.tmp", lock.id));
        fs::write(&tmp_path, content)
            .map_err(|e| BackendError::Io(format!("Failed to write lock file: {}", e)))?;

        let linked = fs::hard_link(&tmp_path, &self.lock_path);
        if let Err(e) = fs::remove_file(&tmp_path) {
            log::debug!("Failed to remove {}: {}", tmp_path.display(), e);
        }

        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(BackendError::Io(format!("Failed to create lock file: {}", e))),
        }
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        let content = match fs::read_to_string(&self.state_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Io(format!("Failed to read state file: {}", e))),
        };

        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!(
                "Failed to parse {}: {}",
                self.state_path.display(),
                e
            ))
        })?;
        Ok(Some(state))
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        let content = serde_json::to_string_pretty(state).map_err(|e| {
            BackendError::Serialization(format!("Failed to serialize state: {}", e))
        })?;

        let tmp_path = self.state_path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .map_err(|e| BackendError::Io(format!("Failed to write state file: {}", e)))?;
        fs::rename(&tmp_path, &self.state_path)
            .map_err(|e| BackendError::Io(format!("Failed to replace state file: {}", e)))?;

        log::debug!("Wrote state serial {} to {}", state.serial, self.state_path.display());
        Ok(())
    }

    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo> {
        self.clear_abandoned_lock()?;

        let lock = LockInfo::new(operation);
        let content = serde_json::to_string_pretty(&lock)
            .map_err(|e| BackendError::Serialization(format!("Failed to serialize lock: {}", e)))?;

        if self.create_lock_file(&lock, &content)? {
            return Ok(lock);
        }

        // Lost the race against another command
        match self.read_lock()? {
            Some(winner) => Err(BackendError::Locked(winner)),
            None => Err(BackendError::Io("Lock file vanished".to_string())),
        }
    }

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()> {
        let existing = self
            .read_lock()?
            .ok_or_else(|| BackendError::LockNotFound(lock.id.clone()))?;

        if existing.id != lock.id {
            return Err(BackendError::LockMismatch {
                expected: lock.id.clone(),
                actual: existing.id,
            });
        }

        fs::remove_file(&self.lock_path)
            .map_err(|e| BackendError::Io(format!("Failed to remove lock file: {}", e)))
    }
}
