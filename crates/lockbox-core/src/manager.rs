//! Unified storage facade
//!
//! Single entry point composing the secure store and the preference store,
//! with explicit backend selection per call. Owns the configuration and
//! reports every operation to the process-wide logger.

use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::StorageConfig;
use crate::error::Result;
use crate::logger::StorageLogger;
use crate::storage::{AccessPolicy, PreferenceStore, SecureStore, Storage};

static GLOBAL: OnceLock<StorageManager> = OnceLock::new();

/// Unified entry point over the secure and preference stores.
pub struct StorageManager {
    secure: SecureStore,
    preferences: PreferenceStore,
    config: StorageConfig,
}

impl StorageManager {
    /// Create a facade from the configuration
    pub fn new(config: StorageConfig) -> Result<Self> {
        let secure = SecureStore::new(config.service.clone(), config.access_group.clone());
        let preferences = PreferenceStore::new(config.suite_name.as_deref())?;
        Ok(Self::with_stores(secure, preferences, config))
    }

    /// Create a facade over injected stores
    pub fn with_stores(
        secure: SecureStore,
        preferences: PreferenceStore,
        config: StorageConfig,
    ) -> Self {
        if config.debug_logging {
            StorageLogger::shared().enable();
        }

        Self {
            secure,
            preferences,
            config,
        }
    }

    /// Process-wide default instance, created lazily with the default
    /// configuration. Callers needing isolation construct their own.
    pub fn global() -> &'static StorageManager {
        GLOBAL.get_or_init(|| {
            StorageManager::new(StorageConfig::default())
                .expect("default storage configuration failed")
        })
    }

    /// Configuration this facade was built with
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Direct access to the strict secure store
    pub fn secure(&self) -> &SecureStore {
        &self.secure
    }

    /// Direct access to the strict preference store
    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    // --- Secure store (sensitive values) ---

    /// Save to the secure store with the default accessibility policy
    pub fn save_secure<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.save_secure_with_policy(key, value, AccessPolicy::default())
    }

    /// Save to the secure store under an explicit accessibility policy
    pub fn save_secure_with_policy<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        policy: AccessPolicy,
    ) -> Result<()> {
        let result = self.secure.save_with_policy(key, value, policy);
        self.report(&result, || {
            format!("saved to secure store: {key} [{}]", policy.as_str())
        });
        result
    }

    /// Load from the secure store
    pub fn load_secure<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let result = self.secure.load(key);
        self.report_load("secure store", key, &result);
        result
    }

    /// Delete from the secure store
    pub fn delete_secure(&self, key: &str) -> Result<()> {
        let result = self.secure.delete(key);
        self.report(&result, || format!("deleted from secure store: {key}"));
        result
    }

    /// Check whether a key exists in the secure store
    pub fn exists_secure(&self, key: &str) -> bool {
        let present = self.secure.exists(key);
        self.log(|| format!("secure store exists: {key} - {present}"));
        present
    }

    /// Delete every record in the secure namespace
    pub fn delete_all_secure(&self) -> Result<()> {
        let result = self.secure.delete_all();
        self.report(&result, || "cleared secure store".to_string());
        result
    }

    /// Save several values to the secure store with the default policy
    pub fn save_secure_batch<T: Serialize>(&self, items: &IndexMap<String, T>) -> Result<()> {
        let result = self.secure.save_batch(items);
        self.report(&result, || {
            format!("saved batch to secure store: {} keys", items.len())
        });
        result
    }

    /// Load several values from the secure store
    pub fn load_secure_batch<T: DeserializeOwned>(
        &self,
        keys: &[&str],
    ) -> Result<IndexMap<String, Option<T>>> {
        let result = self.secure.load_batch(keys);
        self.report(&result, || {
            format!("loaded batch from secure store: {} keys", keys.len())
        });
        result
    }

    /// Delete several keys from the secure store
    pub fn delete_secure_batch(&self, keys: &[&str]) -> Result<()> {
        let result = self.secure.delete_batch(keys);
        self.report(&result, || {
            format!("deleted batch from secure store: {} keys", keys.len())
        });
        result
    }

    // --- Preference store (ordinary settings) ---

    /// Save a preference
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let result = self.preferences.save(key, value);
        self.report(&result, || format!("saved preference: {key}"));
        result
    }

    /// Load a preference
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let result = self.preferences.load(key);
        self.report_load("preferences", key, &result);
        result
    }

    /// Delete a preference
    pub fn delete(&self, key: &str) -> Result<()> {
        let result = self.preferences.delete(key);
        self.report(&result, || format!("deleted preference: {key}"));
        result
    }

    /// Check whether a preference exists
    pub fn exists(&self, key: &str) -> bool {
        let present = self.preferences.exists(key);
        self.log(|| format!("preference exists: {key} - {present}"));
        present
    }

    /// Delete every preference in this store's scope
    pub fn delete_all(&self) -> Result<()> {
        let result = self.preferences.delete_all();
        self.report(&result, || "cleared preferences".to_string());
        result
    }

    /// Lexically sorted preference keys
    pub fn keys(&self) -> Result<Vec<String>> {
        self.preferences.keys()
    }

    /// Save several preferences
    pub fn save_batch<T: Serialize>(&self, items: &IndexMap<String, T>) -> Result<()> {
        let result = self.preferences.save_batch(items);
        self.report(&result, || {
            format!("saved batch of preferences: {} keys", items.len())
        });
        result
    }

    /// Load several preferences
    pub fn load_batch<T: DeserializeOwned>(
        &self,
        keys: &[&str],
    ) -> Result<IndexMap<String, Option<T>>> {
        let result = self.preferences.load_batch(keys);
        self.report(&result, || {
            format!("loaded batch of preferences: {} keys", keys.len())
        });
        result
    }

    /// Delete several preferences
    pub fn delete_batch(&self, keys: &[&str]) -> Result<()> {
        let result = self.preferences.delete_batch(keys);
        self.report(&result, || {
            format!("deleted batch of preferences: {} keys", keys.len())
        });
        result
    }

    fn log(&self, line: impl FnOnce() -> String) {
        let logger = StorageLogger::shared();
        if logger.is_enabled() {
            logger.log(line());
        }
    }

    fn report<T>(&self, result: &Result<T>, describe: impl FnOnce() -> String) {
        let logger = StorageLogger::shared();
        if !logger.is_enabled() {
            return;
        }
        match result {
            Ok(_) => logger.log(describe()),
            Err(err) => logger.log(format!("{} - failed: {err}", describe())),
        }
    }

    fn report_load<T>(&self, surface: &str, key: &str, result: &Result<Option<T>>) {
        let logger = StorageLogger::shared();
        if !logger.is_enabled() {
            return;
        }
        match result {
            Ok(Some(_)) => logger.log(format!("loaded from {surface}: {key} - hit")),
            Ok(None) => logger.log(format!("loaded from {surface}: {key} - absent")),
            Err(err) => logger.log(format!("loaded from {surface}: {key} - failed: {err}")),
        }
    }
}
