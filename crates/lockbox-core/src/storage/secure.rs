//! Secure credential store
//!
//! Wraps the OS credential service:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)
//!
//! Records are scoped by a service namespace and an optional sharing group.
//! The credential service cannot enumerate entries portably, so the store
//! keeps a key index record under a reserved account name; draining the
//! index is what empties a namespace in one call.

use std::collections::BTreeSet;
use std::sync::Arc;

use keyring::Entry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use zeroize::Zeroizing;

use super::policy::AccessPolicy;
use super::traits::Storage;
use crate::codec;
use crate::error::{Result, StorageError};

/// Account names with this prefix are reserved for internal records.
pub const RESERVED_ACCOUNT_PREFIX: &str = "__lockbox.";

/// Account name of the key index record
const INDEX_ACCOUNT: &str = "__lockbox.index__";

/// Pluggable seam over the platform credential service.
///
/// The default implementation is [`KeyringBackend`]; tests and headless
/// environments use [`crate::storage::MemoryCredentialBackend`].
pub trait CredentialBackend: Send + Sync {
    /// Store a secret, replacing any existing one in the slot
    fn set(
        &self,
        target: Option<&str>,
        service: &str,
        account: &str,
        secret: &str,
        policy: AccessPolicy,
    ) -> keyring::Result<()>;

    /// Fetch a secret; `NoEntry` when the slot is empty
    fn get(&self, target: Option<&str>, service: &str, account: &str) -> keyring::Result<String>;

    /// Remove a secret; `NoEntry` when the slot is empty
    fn delete(&self, target: Option<&str>, service: &str, account: &str) -> keyring::Result<()>;

    /// Metadata-only presence check
    fn probe(&self, target: Option<&str>, service: &str, account: &str) -> keyring::Result<()>;
}

/// Default backend over the `keyring` crate.
///
/// The crate does not expose per-entry accessibility attributes, so the
/// requested policy is traced and the platform default applies.
#[derive(Debug, Default)]
pub struct KeyringBackend;

impl KeyringBackend {
    fn entry(target: Option<&str>, service: &str, account: &str) -> keyring::Result<Entry> {
        match target {
            Some(target) => Entry::new_with_target(target, service, account),
            None => Entry::new(service, account),
        }
    }
}

impl CredentialBackend for KeyringBackend {
    fn set(
        &self,
        target: Option<&str>,
        service: &str,
        account: &str,
        secret: &str,
        policy: AccessPolicy,
    ) -> keyring::Result<()> {
        debug!("storing credential {} [{}]", account, policy.as_str());
        Self::entry(target, service, account)?.set_password(secret)
    }

    fn get(&self, target: Option<&str>, service: &str, account: &str) -> keyring::Result<String> {
        Self::entry(target, service, account)?.get_password()
    }

    fn delete(&self, target: Option<&str>, service: &str, account: &str) -> keyring::Result<()> {
        Self::entry(target, service, account)?.delete_password()
    }

    fn probe(&self, target: Option<&str>, service: &str, account: &str) -> keyring::Result<()> {
        Self::entry(target, service, account)?.get_password().map(|_| ())
    }
}

/// Access-controlled storage for sensitive values, one record per key.
pub struct SecureStore {
    service: String,
    access_group: Option<String>,
    backend: Arc<dyn CredentialBackend>,
}

impl SecureStore {
    /// Create a store over the platform credential service
    pub fn new(service: impl Into<String>, access_group: Option<String>) -> Self {
        Self::with_backend(service, access_group, Arc::new(KeyringBackend))
    }

    /// Create a store over a custom credential backend
    pub fn with_backend(
        service: impl Into<String>,
        access_group: Option<String>,
        backend: Arc<dyn CredentialBackend>,
    ) -> Self {
        Self {
            service: service.into(),
            access_group,
            backend,
        }
    }

    /// Service namespace this store is scoped to
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Encode a value and store it under the given accessibility policy.
    pub fn save_with_policy<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        policy: AccessPolicy,
    ) -> Result<()> {
        let bytes = Zeroizing::new(codec::to_bytes(value)?);
        self.store(key, &bytes, policy)
    }

    /// Store raw bytes under the key with the given accessibility policy.
    ///
    /// Replaces any existing record as an unconditional delete-then-add, so
    /// the write path never has to distinguish insert from update.
    pub fn store(&self, key: &str, value: &[u8], policy: AccessPolicy) -> Result<()> {
        ensure_valid_key(key)?;
        let encoded = Zeroizing::new(base64_encode(value));

        match self.backend.delete(self.group(), &self.service, key) {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(err) => return Err(map_backend_error(err)),
        }
        self.backend
            .set(self.group(), &self.service, key, &encoded, policy.effective())
            .map_err(map_backend_error)?;
        self.index_insert(key)?;

        debug!("stored secure record: {}", key);
        Ok(())
    }

    /// Retrieve the raw byte payload under the key, if any.
    pub fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        ensure_valid_key(key)?;
        match self.backend.get(self.group(), &self.service, key) {
            Ok(encoded) => {
                let encoded = Zeroizing::new(encoded);
                Ok(Some(base64_decode(&encoded)?))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(map_backend_error(err)),
        }
    }

    fn group(&self) -> Option<&str> {
        self.access_group.as_deref()
    }

    fn index_read(&self) -> Result<BTreeSet<String>> {
        match self.backend.get(self.group(), &self.service, INDEX_ACCOUNT) {
            Ok(payload) => serde_json::from_str(&payload).map_err(|_| StorageError::InvalidData),
            Err(keyring::Error::NoEntry) => Ok(BTreeSet::new()),
            Err(err) => Err(map_backend_error(err)),
        }
    }

    fn index_write(&self, index: &BTreeSet<String>) -> Result<()> {
        let payload = serde_json::to_string(index).map_err(StorageError::EncodingFailed)?;
        self.backend
            .set(
                self.group(),
                &self.service,
                INDEX_ACCOUNT,
                &payload,
                AccessPolicy::default(),
            )
            .map_err(map_backend_error)
    }

    fn index_insert(&self, key: &str) -> Result<()> {
        let mut index = self.index_read()?;
        if index.insert(key.to_string()) {
            self.index_write(&index)?;
        }
        Ok(())
    }

    fn index_remove(&self, key: &str) -> Result<()> {
        let mut index = self.index_read()?;
        if index.remove(key) {
            self.index_write(&index)?;
        }
        Ok(())
    }
}

impl Storage for SecureStore {
    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.save_with_policy(key, value, AccessPolicy::default())
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.retrieve(key)? {
            Some(bytes) => {
                let bytes = Zeroizing::new(bytes);
                Ok(Some(codec::from_bytes(&bytes)?))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        ensure_valid_key(key)?;
        match self.backend.delete(self.group(), &self.service, key) {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                self.index_remove(key)?;
                debug!("deleted secure record: {}", key);
                Ok(())
            }
            Err(err) => Err(map_backend_error(err)),
        }
    }

    fn delete_all(&self) -> Result<()> {
        // Namespace-scoped: drains every key the index tracks, then the index.
        let index = self.index_read()?;
        for key in &index {
            match self.backend.delete(self.group(), &self.service, key) {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(err) => return Err(map_backend_error(err)),
            }
        }
        match self.backend.delete(self.group(), &self.service, INDEX_ACCOUNT) {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(err) => return Err(map_backend_error(err)),
        }
        debug!("cleared secure namespace: {}", self.service);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.backend.probe(self.group(), &self.service, key).is_ok()
    }
}

fn ensure_valid_key(key: &str) -> Result<()> {
    if key.is_empty() || key.starts_with(RESERVED_ACCOUNT_PREFIX) {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn map_backend_error(err: keyring::Error) -> StorageError {
    match err {
        keyring::Error::NoStorageAccess(_) => StorageError::AccessDenied,
        keyring::Error::BadEncoding(_) => StorageError::InvalidData,
        other => StorageError::Backend(other),
    }
}

/// Base64 encode bytes
fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Base64 decode string
fn base64_decode(encoded: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| StorageError::InvalidData)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCredentialBackend;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Token {
        value: String,
        refresh: Option<String>,
    }

    fn test_store() -> (SecureStore, Arc<MemoryCredentialBackend>) {
        let backend = Arc::new(MemoryCredentialBackend::new());
        let store = SecureStore::with_backend("com.lockbox.test", None, backend.clone());
        (store, backend)
    }

    #[test]
    fn test_save_and_load() {
        let (store, _) = test_store();
        let token = Token {
            value: "abc123".to_string(),
            refresh: Some("r1".to_string()),
        };

        store.save("auth.token", &token).unwrap();

        let loaded: Token = store.load("auth.token").unwrap().unwrap();
        assert_eq!(loaded, token);
    }

    #[test]
    fn test_load_absent_is_none() {
        let (store, _) = test_store();
        let loaded: Option<String> = store.load("missing").unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn test_overwrite_keeps_last_value() {
        let (store, _) = test_store();

        store.save("key", &"first".to_string()).unwrap();
        store.save("key", &"second".to_string()).unwrap();

        let loaded: String = store.load("key").unwrap().unwrap();
        assert_eq!(loaded, "second");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (store, _) = test_store();

        assert!(!store.exists("gone"));
        store.delete("gone").unwrap();
        assert!(!store.exists("gone"));

        store.save("gone", &1i32).unwrap();
        store.delete("gone").unwrap();
        store.delete("gone").unwrap();
        assert!(!store.exists("gone"));
    }

    #[test]
    fn test_exists() {
        let (store, _) = test_store();

        assert!(!store.exists("flag"));
        store.save("flag", &true).unwrap();
        assert!(store.exists("flag"));
    }

    #[test]
    fn test_delete_all_empties_namespace() {
        let (store, _) = test_store();

        store.save("a", &1i32).unwrap();
        store.save("b", &2i32).unwrap();
        store.save("c", &3i32).unwrap();

        store.delete_all().unwrap();

        assert!(!store.exists("a"));
        assert!(!store.exists("b"));
        assert!(!store.exists("c"));
        assert!(!store.exists(INDEX_ACCOUNT));
    }

    #[test]
    fn test_policy_reaches_backend() {
        let (store, backend) = test_store();

        store
            .save_with_policy("pin", &"1234".to_string(), AccessPolicy::WhenUnlocked)
            .unwrap();
        assert_eq!(
            backend.policy_for(None, "com.lockbox.test", "pin"),
            Some(AccessPolicy::WhenUnlocked)
        );

        // Discouraged policies are downgraded before they reach the backend.
        store
            .save_with_policy("legacy", &"x".to_string(), AccessPolicy::Always)
            .unwrap();
        assert_eq!(
            backend.policy_for(None, "com.lockbox.test", "legacy"),
            Some(AccessPolicy::AfterFirstUnlock)
        );
    }

    #[test]
    fn test_reserved_and_empty_keys_rejected() {
        let (store, _) = test_store();

        assert!(matches!(
            store.save("", &1i32),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.save("__lockbox.evil", &1i32),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_store_and_retrieve_raw_bytes() {
        let (store, _) = test_store();

        store
            .store("blob", &[0xde, 0xad, 0xbe, 0xef], AccessPolicy::default())
            .unwrap();
        let bytes = store.retrieve("blob").unwrap().unwrap();
        assert_eq!(bytes, vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_sharing_group_isolates_slots() {
        let backend = Arc::new(MemoryCredentialBackend::new());
        let grouped = SecureStore::with_backend(
            "com.lockbox.test",
            Some("group.shared".to_string()),
            backend.clone(),
        );
        let plain = SecureStore::with_backend("com.lockbox.test", None, backend);

        grouped.save("key", &"grouped".to_string()).unwrap();
        assert!(!plain.exists("key"));
    }
}
