//! Storage migration utilities
//!
//! Stateless relocation operations over explicitly passed stores: renaming
//! preference keys in place and moving values between the preference and
//! secure stores. Each call is at-most-once and idempotent on retry. The
//! copy and the delete are separate operations, so a failure between them
//! leaves the value present in both places.

use tracing::debug;

use crate::codec::{self, RawValue};
use crate::error::Result;
use crate::storage::{AccessPolicy, PreferenceStore, SecureStore, Storage};

/// Error handling for batch migrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchErrorPolicy {
    /// Stop at the first failing pair; later pairs are not attempted
    #[default]
    AbortOnFirstError,
    /// Attempt every pair; surface the first recorded error afterwards
    ContinueOnError,
}

/// Rename a preference key in place. No-op when `old_key` is absent.
///
/// The raw native value is copied, so the stored representation survives
/// the rename unchanged.
pub fn rename_key(
    prefs: &PreferenceStore,
    old_key: &str,
    new_key: &str,
    delete_old: bool,
) -> Result<()> {
    let Some(value) = prefs.raw_value(old_key)? else {
        return Ok(());
    };

    prefs.set_raw(new_key, value)?;
    if delete_old {
        prefs.delete(old_key)?;
    }

    debug!("renamed preference key: {} -> {}", old_key, new_key);
    Ok(())
}

/// Move a preference value into the secure store under the same key.
///
/// Byte payloads move verbatim, text becomes its UTF-8 bytes, and any other
/// native scalar is encoded through the structured fallback. No-op when the
/// key is absent in the preference store.
pub fn move_to_secure(
    prefs: &PreferenceStore,
    secure: &SecureStore,
    key: &str,
    delete_after: bool,
) -> Result<()> {
    let Some(raw) = prefs.raw_value(key)? else {
        return Ok(());
    };

    let bytes = match raw {
        RawValue::Bytes(bytes) => bytes,
        RawValue::Text(text) => text.into_bytes(),
        RawValue::Bool(value) => codec::to_bytes(&value)?,
        RawValue::Int(value) => codec::to_bytes(&value)?,
        RawValue::Float(value) => codec::to_bytes(&value)?,
    };

    secure.store(key, &bytes, AccessPolicy::default())?;
    if delete_after {
        prefs.delete(key)?;
    }

    debug!("moved preference to secure store: {}", key);
    Ok(())
}

/// Move a secure record into the preference store under the same key.
///
/// The secure payload lands verbatim as a byte value. No-op when the key is
/// absent in the secure store.
pub fn move_from_secure(
    secure: &SecureStore,
    prefs: &PreferenceStore,
    key: &str,
    delete_after: bool,
) -> Result<()> {
    let Some(bytes) = secure.retrieve(key)? else {
        return Ok(());
    };

    prefs.set_raw(key, RawValue::Bytes(bytes))?;
    if delete_after {
        secure.delete(key)?;
    }

    debug!("moved secure record to preferences: {}", key);
    Ok(())
}

/// Apply [`rename_key`] to each pair, in the given order.
pub fn batch_rename_keys(
    prefs: &PreferenceStore,
    pairs: &[(&str, &str)],
    delete_old: bool,
    policy: BatchErrorPolicy,
) -> Result<()> {
    let mut first_error = None;

    for (old_key, new_key) in pairs {
        match rename_key(prefs, old_key, new_key, delete_old) {
            Ok(()) => {}
            Err(err) => match policy {
                BatchErrorPolicy::AbortOnFirstError => return Err(err),
                BatchErrorPolicy::ContinueOnError => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            },
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
