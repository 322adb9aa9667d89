//! State file access for a single command
//!
//! A session holds the backend lock from `open` until `close`, so two
//! commands never write the same state file at once.

use baas_core::resource::{ResourceId, State};
use baas_state::{BackendConfig, LockInfo, StateBackend, StateFile, create_backend};

pub struct StateSession {
    backend: Box<dyn StateBackend>,
    lock: LockInfo,
    state: StateFile,
    dirty: bool,
}

impl StateSession {
    /// Take the lock and load the current state
    pub async fn open(config: &BackendConfig, operation: &str) -> Result<Self, String> {
        let backend = create_backend(config).map_err(|e| e.to_string())?;
        let lock = backend
            .acquire_lock(operation)
            .await
            .map_err(|e| e.to_string())?;

        let state = match backend.read_state().await {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                if let Err(release) = backend.release_lock(&lock).await {
                    log::warn!("Failed to release lock: {}", release);
                }
                return Err(e.to_string());
            }
        };

        Ok(Self {
            backend,
            lock,
            state,
            dirty: false,
        })
    }

    pub fn identifier_of(&self, id: &ResourceId) -> Option<String> {
        self.state.identifier_of(id).map(str::to_string)
    }

    /// Record what the provider returned
    pub fn record(&mut self, provider: &str, state: &State) {
        if self.state.apply_read(provider, state) {
            self.dirty = true;
        }
    }

    pub fn forget(&mut self, id: &ResourceId) {
        if self.state.remove_resource(id).is_some() {
            self.dirty = true;
        }
    }

    /// Write the state if it changed, then release the lock
    pub async fn close(mut self) -> Result<(), String> {
        let written = if self.dirty {
            self.state.increment_serial();
            self.backend
                .write_state(&self.state)
                .await
                .map_err(|e| e.to_string())
        } else {
            Ok(())
        };

        let released = self
            .backend
            .release_lock(&self.lock)
            .await
            .map_err(|e| e.to_string());

        written.and(released)
    }
}
