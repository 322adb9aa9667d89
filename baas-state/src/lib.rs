//! Baas State Management
//!
//! Records which server object backs each user-chosen name, so that
//! `baas policy get daily-policy` knows the policy id to read.
//!
//! - **StateFile**: the persisted list of known resources
//! - **StateBackend**: storage of the state file plus locking
//! - **LockInfo**: who holds the state lock and until when
//!
//! # Example
//!
//! ```ignore
//! use baas_state::{create_backend, BackendConfig};
//!
//! let backend = create_backend(&BackendConfig::local("baas.state.json"))?;
//! let lock = backend.acquire_lock("policy create").await?;
//!
//! let mut state = backend.read_state().await?.unwrap_or_default();
//! state.apply_read("ibm", &created);
//! state.increment_serial();
//! backend.write_state(&state).await?;
//!
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

// Re-export main types for convenience
pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::{LocalBackend, create_backend};
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
