//! # lockbox-core
//!
//! Unified key-value persistence over two heterogeneous stores:
//! - the OS credential service for sensitive values (access-controlled,
//!   gated by an accessibility policy)
//! - a plain preference table for ordinary settings (enumerable, optionally
//!   shared across processes via a named suite)
//!
//! plus a codec that round-trips arbitrary serde values through each
//! backend's native representation, a composed facade with per-call backend
//! selection, live-access field bindings, and key/value migration
//! utilities.

pub mod codec;
pub mod config;
pub mod error;
pub mod fields;
pub mod logger;
pub mod manager;
pub mod migration;
pub mod storage;

pub use codec::RawValue;
pub use config::{StorageConfig, DEFAULT_SERVICE};
pub use error::{Result, StorageError};
pub use fields::{PreferenceField, SecureField};
pub use logger::StorageLogger;
pub use manager::StorageManager;
pub use migration::{batch_rename_keys, move_from_secure, move_to_secure, rename_key, BatchErrorPolicy};
pub use storage::{
    AccessPolicy, CredentialBackend, KeyringBackend, MemoryCredentialBackend, PreferenceStore,
    SecureStore, Storage,
};
