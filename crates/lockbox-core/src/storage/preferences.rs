//! Preference store
//!
//! Unprotected key-value storage backed by a JSON table in the user's
//! configuration directory. An optional suite name selects a shared table so
//! several processes see the same entries. Scalar values are held in their
//! native representation (see [`crate::codec`]); everything else is a
//! structured blob.
//!
//! Every operation reads the table live and every mutation commits
//! synchronously before returning. There is no cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::Storage;
use crate::codec::{self, RawValue};
use crate::error::{Result, StorageError};

/// Table format version
const FILE_VERSION: u32 = 1;

/// Table name when no suite is given
const DEFAULT_TABLE: &str = "preferences";

/// Keys with these prefixes belong to tooling sharing the table; they are
/// hidden from enumeration and survive `delete_all`.
const RESERVED_KEY_PREFIXES: &[&str] = &["__", "lockbox."];

/// On-disk table format
#[derive(Debug, Serialize, Deserialize)]
struct TableFile {
    version: u32,
    entries: BTreeMap<String, RawValue>,
}

impl Default for TableFile {
    fn default() -> Self {
        Self {
            version: FILE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Plain, enumerable key-value storage.
pub struct PreferenceStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl PreferenceStore {
    /// Open the default table, or a named suite shared across processes
    pub fn new(suite: Option<&str>) -> Result<Self> {
        let dir = Self::default_dir()?;
        Self::with_dir(&dir, suite)
    }

    /// Open a table under a custom directory (for testing)
    pub fn with_dir(dir: &Path, suite: Option<&str>) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let table = suite.unwrap_or(DEFAULT_TABLE);
        let path = dir.join(format!("{table}.json"));

        debug!("preference table at {:?}", path);

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing table file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Native representation stored under the key, if any.
    pub fn raw_value(&self, key: &str) -> Result<Option<RawValue>> {
        Ok(self.read_table()?.entries.get(key).cloned())
    }

    /// Store a native representation directly.
    pub fn set_raw(&self, key: &str, value: RawValue) -> Result<()> {
        ensure_valid_key(key)?;
        self.mutate(|table| {
            table.entries.insert(key.to_string(), value);
        })
    }

    /// All visible entries, reserved keys excluded, in lexical order.
    pub fn raw_entries(&self) -> Result<BTreeMap<String, RawValue>> {
        Ok(self
            .read_table()?
            .entries
            .into_iter()
            .filter(|(key, _)| !is_reserved(key))
            .collect())
    }

    /// Lexically sorted keys, reserved prefixes excluded.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.raw_entries()?.into_keys().collect())
    }

    fn default_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "symbia-labs", "lockbox")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| {
                StorageError::Unknown("could not determine config directory".to_string())
            })
    }

    fn read_table(&self) -> Result<TableFile> {
        if !self.path.exists() {
            return Ok(TableFile::default());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(StorageError::DecodingFailed)
    }

    fn write_table(&self, table: &TableFile) -> Result<()> {
        let contents = serde_json::to_string_pretty(table).map_err(StorageError::EncodingFailed)?;

        // Write atomically using a temp file
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut TableFile) -> R) -> Result<R> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut table = self.read_table()?;
        let out = apply(&mut table);
        table.version = FILE_VERSION;
        self.write_table(&table)?;
        Ok(out)
    }
}

impl Storage for PreferenceStore {
    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        ensure_valid_key(key)?;
        let raw = codec::to_raw(value)?;
        self.mutate(|table| {
            table.entries.insert(key.to_string(), raw);
        })?;
        debug!("stored preference: {}", key);
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.raw_value(key)? {
            Some(raw) => Ok(Some(codec::from_raw(&raw)?)),
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.mutate(|table| {
            table.entries.remove(key);
        })?;
        debug!("deleted preference: {}", key);
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        self.mutate(|table| {
            table.entries.retain(|key, _| is_reserved(key));
        })?;
        debug!("cleared preference table");
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.read_table()
            .map(|table| table.entries.contains_key(key))
            .unwrap_or(false)
    }
}

fn ensure_valid_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn is_reserved(key: &str) -> bool {
    RESERVED_KEY_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Appearance {
        dark_mode: bool,
        font_size: u32,
    }

    fn test_store() -> (PreferenceStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::with_dir(temp_dir.path(), None).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_save_and_load_scalars() {
        let (store, _dir) = test_store();

        store.save("app.settings.isDarkMode", &true).unwrap();
        store.save("app.settings.fontSize", &14i32).unwrap();
        store.save("app.settings.scale", &1.25f64).unwrap();
        store.save("app.settings.language", &"ko".to_string()).unwrap();

        assert_eq!(store.load::<bool>("app.settings.isDarkMode").unwrap(), Some(true));
        assert_eq!(store.load::<i32>("app.settings.fontSize").unwrap(), Some(14));
        assert_eq!(store.load::<f64>("app.settings.scale").unwrap(), Some(1.25));
        assert_eq!(
            store.load::<String>("app.settings.language").unwrap(),
            Some("ko".to_string())
        );
    }

    #[test]
    fn test_scalars_stored_natively() {
        let (store, _dir) = test_store();

        store.save("flag", &true).unwrap();
        assert_eq!(store.raw_value("flag").unwrap(), Some(RawValue::Bool(true)));

        store.save("count", &3i64).unwrap();
        assert_eq!(store.raw_value("count").unwrap(), Some(RawValue::Int(3)));
    }

    #[test]
    fn test_save_and_load_struct() {
        let (store, _dir) = test_store();
        let appearance = Appearance {
            dark_mode: true,
            font_size: 14,
        };

        store.save("appearance", &appearance).unwrap();

        let loaded: Appearance = store.load("appearance").unwrap().unwrap();
        assert_eq!(loaded, appearance);
    }

    #[test]
    fn test_absence_vs_falsy_value() {
        let (store, _dir) = test_store();

        assert!(!store.exists("flag"));
        assert_eq!(store.load::<bool>("flag").unwrap(), None);

        store.save("flag", &false).unwrap();

        assert!(store.exists("flag"));
        assert_eq!(store.load::<bool>("flag").unwrap(), Some(false));

        store.save("count", &0i32).unwrap();
        assert_eq!(store.load::<i32>("count").unwrap(), Some(0));
    }

    #[test]
    fn test_overwrite_keeps_last_value() {
        let (store, _dir) = test_store();

        store.save("key", &"A".to_string()).unwrap();
        store.save("key", &"B".to_string()).unwrap();

        assert_eq!(store.load::<String>("key").unwrap(), Some("B".to_string()));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (store, _dir) = test_store();

        assert!(!store.exists("gone"));
        store.delete("gone").unwrap();
        assert!(!store.exists("gone"));

        store.save("gone", &1i32).unwrap();
        store.delete("gone").unwrap();
        store.delete("gone").unwrap();
        assert!(!store.exists("gone"));
    }

    #[test]
    fn test_keys_sorted_and_reserved_hidden() {
        let (store, _dir) = test_store();

        store.save("zeta", &1i32).unwrap();
        store.save("alpha", &2i32).unwrap();
        store.save("mid", &3i32).unwrap();
        store.set_raw("__internal.marker", RawValue::Bool(true)).unwrap();
        store.set_raw("lockbox.reserved", RawValue::Int(1)).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_delete_all_preserves_reserved_keys() {
        let (store, _dir) = test_store();

        store.save("user.key", &1i32).unwrap();
        store.set_raw("__internal.marker", RawValue::Bool(true)).unwrap();

        store.delete_all().unwrap();

        assert!(!store.exists("user.key"));
        assert!(store.exists("__internal.marker"));
    }

    #[test]
    fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = PreferenceStore::with_dir(temp_dir.path(), None).unwrap();
            store.save("persistent", &"value".to_string()).unwrap();
        }

        {
            let store = PreferenceStore::with_dir(temp_dir.path(), None).unwrap();
            assert_eq!(
                store.load::<String>("persistent").unwrap(),
                Some("value".to_string())
            );
        }
    }

    #[test]
    fn test_suites_are_separate_tables() {
        let temp_dir = TempDir::new().unwrap();
        let default = PreferenceStore::with_dir(temp_dir.path(), None).unwrap();
        let suite = PreferenceStore::with_dir(temp_dir.path(), Some("group.shared")).unwrap();

        default.save("key", &"default".to_string()).unwrap();
        suite.save("key", &"suite".to_string()).unwrap();

        assert_eq!(default.load::<String>("key").unwrap(), Some("default".to_string()));
        assert_eq!(suite.load::<String>("key").unwrap(), Some("suite".to_string()));
    }

    #[test]
    fn test_shared_suite_visible_to_second_instance() {
        let temp_dir = TempDir::new().unwrap();
        let writer = PreferenceStore::with_dir(temp_dir.path(), Some("shared")).unwrap();
        let reader = PreferenceStore::with_dir(temp_dir.path(), Some("shared")).unwrap();

        writer.save("announcement", &"hello".to_string()).unwrap();

        assert_eq!(
            reader.load::<String>("announcement").unwrap(),
            Some("hello".to_string())
        );
    }

    #[test]
    fn test_batch_operations() {
        let (store, _dir) = test_store();

        let mut items = indexmap::IndexMap::new();
        items.insert("k1".to_string(), "v1".to_string());
        items.insert("k2".to_string(), "v2".to_string());
        items.insert("k3".to_string(), "v3".to_string());
        store.save_batch(&items).unwrap();

        let loaded = store.load_batch::<String>(&["k1", "k2", "k3", "k4"]).unwrap();
        assert_eq!(loaded["k1"], Some("v1".to_string()));
        assert_eq!(loaded["k2"], Some("v2".to_string()));
        assert_eq!(loaded["k3"], Some("v3".to_string()));
        assert_eq!(loaded["k4"], None);

        store.delete_batch(&["k1", "k2"]).unwrap();
        assert!(!store.exists("k1"));
        assert!(!store.exists("k2"));
        assert!(store.exists("k3"));
    }

    #[test]
    fn test_load_required() {
        let (store, _dir) = test_store();

        store.save("present", &1i32).unwrap();
        assert_eq!(store.load_required::<i32>("present").unwrap(), 1);

        let missing = store.load_required::<i32>("missing");
        assert!(matches!(missing, Err(StorageError::ItemNotFound(key)) if key == "missing"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let (store, _dir) = test_store();
        assert!(matches!(
            store.save("", &1i32),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
