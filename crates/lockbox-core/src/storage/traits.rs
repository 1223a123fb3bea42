//! Storage trait definitions

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StorageError};

/// Common contract for both storage backends.
///
/// Batch operations apply the single-key operation independently per key in
/// the given order. They are not atomic: the first error aborts the
/// remaining keys and already-applied keys are not rolled back.
pub trait Storage {
    /// Store a value under the given key, overwriting any previous value
    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()>;

    /// Retrieve a value by key; absence is `Ok(None)`, not an error
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;

    /// Delete a value by key; deleting an absent key succeeds
    fn delete(&self, key: &str) -> Result<()>;

    /// Delete every value in this store's scope
    fn delete_all(&self) -> Result<()>;

    /// Check whether any value is stored under the key
    fn exists(&self, key: &str) -> bool;

    /// Like [`Storage::load`], but absence is [`StorageError::ItemNotFound`]
    fn load_required<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.load(key)?
            .ok_or_else(|| StorageError::ItemNotFound(key.to_string()))
    }

    /// Store several values at once
    fn save_batch<T: Serialize>(&self, items: &IndexMap<String, T>) -> Result<()> {
        for (key, value) in items {
            self.save(key, value)?;
        }
        Ok(())
    }

    /// Retrieve several values at once
    fn load_batch<T: DeserializeOwned>(
        &self,
        keys: &[&str],
    ) -> Result<IndexMap<String, Option<T>>> {
        let mut result = IndexMap::with_capacity(keys.len());
        for key in keys {
            result.insert((*key).to_string(), self.load(key)?);
        }
        Ok(result)
    }

    /// Delete several keys at once
    fn delete_batch(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }
}
