//! Debug logger for storage operations
//!
//! A process-wide toggle in front of `tracing`: when disabled, operations
//! emit nothing; when enabled, every facade operation emits one event under
//! the `lockbox` target. Timestamps and the target label are rendered by the
//! installed subscriber. Purely observational; never consulted for control
//! decisions.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::Result;
use crate::storage::PreferenceStore;

static SHARED: StorageLogger = StorageLogger {
    enabled: AtomicBool::new(false),
};

/// Process-wide storage logger
pub struct StorageLogger {
    enabled: AtomicBool,
}

impl StorageLogger {
    /// The process-wide instance
    pub fn shared() -> &'static StorageLogger {
        &SHARED
    }

    /// Enable logging
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Disable logging
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    /// Whether logging is currently enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Emit one operation line when enabled.
    pub fn log(&self, message: impl AsRef<str>) {
        if self.is_enabled() {
            debug!(target: "lockbox", "{}", message.as_ref());
        }
    }

    /// Dump every visible entry of a preference store to the log sink.
    pub fn dump_preferences(&self, store: &PreferenceStore) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let entries = store.raw_entries()?;
        debug!(target: "lockbox", "=== preference table ({} entries) ===", entries.len());
        for (key, value) in &entries {
            debug!(target: "lockbox", "{}: {:?}", key, value);
        }
        Ok(())
    }
}
