//! Live-access field bindings
//!
//! Field-like adapters that perform a backend round trip on every access;
//! there is no cache. All backend errors are swallowed into absence or the
//! configured default, trading error visibility for call-site brevity. Use
//! the stores directly when failures must be observable.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::storage::{AccessPolicy, PreferenceStore, SecureStore, Storage};

/// Binding to one secure-store record.
pub struct SecureField<T> {
    key: String,
    policy: AccessPolicy,
    store: SecureStore,
    _value: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> SecureField<T> {
    /// Bind a key in the given service namespace with the default policy
    pub fn new(key: impl Into<String>, service: impl Into<String>) -> Self {
        Self::with_store(key, AccessPolicy::default(), SecureStore::new(service, None))
    }

    /// Bind with an explicit policy and store
    pub fn with_store(key: impl Into<String>, policy: AccessPolicy, store: SecureStore) -> Self {
        Self {
            key: key.into(),
            policy,
            store,
            _value: PhantomData,
        }
    }

    /// Live read; any failure reads as absence.
    pub fn get(&self) -> Option<T> {
        self.store.load(&self.key).ok().flatten()
    }

    /// Live write; `None` deletes the record. Failures are swallowed.
    pub fn set(&self, value: Option<&T>) {
        let _ = match value {
            Some(value) => self.store.save_with_policy(&self.key, value, self.policy),
            None => self.store.delete(&self.key),
        };
    }
}

/// Binding to one preference entry with a default value.
pub struct PreferenceField<T> {
    key: String,
    default: T,
    store: PreferenceStore,
}

impl<T: Serialize + DeserializeOwned + Clone> PreferenceField<T> {
    /// Bind a key in the default or named suite
    pub fn new(key: impl Into<String>, default: T, suite: Option<&str>) -> Result<Self> {
        Ok(Self::with_store(key, default, PreferenceStore::new(suite)?))
    }

    /// Bind over an explicit store
    pub fn with_store(key: impl Into<String>, default: T, store: PreferenceStore) -> Self {
        Self {
            key: key.into(),
            default,
            store,
        }
    }

    /// Live read; absence or any failure reads as the default.
    pub fn get(&self) -> T {
        self.store
            .load(&self.key)
            .ok()
            .flatten()
            .unwrap_or_else(|| self.default.clone())
    }

    /// Live write; failures are swallowed.
    pub fn set(&self, value: &T) {
        let _ = self.store.save(&self.key, value);
    }
}
