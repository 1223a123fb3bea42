//! In-memory credential backend
//!
//! Stand-in for the platform credential service, used by tests and headless
//! environments without a keychain daemon. Reports the same `keyring`
//! statuses as the platform backend, and records the accessibility policy
//! each secret was written with.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::policy::AccessPolicy;
use super::secure::CredentialBackend;

type Slot = (Option<String>, String, String);

#[derive(Debug, Clone)]
struct StoredSecret {
    secret: String,
    policy: AccessPolicy,
}

/// In-memory credential backend
#[derive(Debug, Default)]
pub struct MemoryCredentialBackend {
    entries: Mutex<HashMap<Slot, StoredSecret>>,
}

impl MemoryCredentialBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Accessibility policy recorded for a stored secret, if present.
    pub fn policy_for(
        &self,
        target: Option<&str>,
        service: &str,
        account: &str,
    ) -> Option<AccessPolicy> {
        self.lock()
            .get(&slot(target, service, account))
            .map(|stored| stored.policy)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Slot, StoredSecret>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn slot(target: Option<&str>, service: &str, account: &str) -> Slot {
    (
        target.map(str::to_owned),
        service.to_owned(),
        account.to_owned(),
    )
}

impl CredentialBackend for MemoryCredentialBackend {
    fn set(
        &self,
        target: Option<&str>,
        service: &str,
        account: &str,
        secret: &str,
        policy: AccessPolicy,
    ) -> keyring::Result<()> {
        self.lock().insert(
            slot(target, service, account),
            StoredSecret {
                secret: secret.to_owned(),
                policy,
            },
        );
        Ok(())
    }

    fn get(&self, target: Option<&str>, service: &str, account: &str) -> keyring::Result<String> {
        self.lock()
            .get(&slot(target, service, account))
            .map(|stored| stored.secret.clone())
            .ok_or(keyring::Error::NoEntry)
    }

    fn delete(&self, target: Option<&str>, service: &str, account: &str) -> keyring::Result<()> {
        match self.lock().remove(&slot(target, service, account)) {
            Some(_) => Ok(()),
            None => Err(keyring::Error::NoEntry),
        }
    }

    fn probe(&self, target: Option<&str>, service: &str, account: &str) -> keyring::Result<()> {
        if self.lock().contains_key(&slot(target, service, account)) {
            Ok(())
        } else {
            Err(keyring::Error::NoEntry)
        }
    }
}
