//! Storage backends behind the unified facade
//!
//! Two backends implement the common [`Storage`] contract:
//! 1. Secure store over the OS credential service
//! 2. Preference table for plain, enumerable settings

mod memory;
mod policy;
mod preferences;
mod secure;
mod traits;

pub use memory::MemoryCredentialBackend;
pub use policy::AccessPolicy;
pub use preferences::PreferenceStore;
pub use secure::{CredentialBackend, KeyringBackend, SecureStore, RESERVED_ACCOUNT_PREFIX};
pub use traits::Storage;
