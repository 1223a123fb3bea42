//! Accessibility policies for secure-store records

use serde::{Deserialize, Serialize};

/// When a secure-store record may be read relative to device lock state,
/// and whether it is included in backups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessPolicy {
    /// Readable any time after the first unlock following boot (default)
    #[default]
    AfterFirstUnlock,
    /// Same as `AfterFirstUnlock`, excluded from backups
    AfterFirstUnlockDeviceOnly,
    /// Readable only while the device is unlocked
    WhenUnlocked,
    /// Same as `WhenUnlocked`, excluded from backups
    WhenUnlockedDeviceOnly,
    /// Readable only when a passcode is set; never leaves the device
    WhenPasscodeSetDeviceOnly,
    /// Always readable (discouraged)
    Always,
    /// Always readable, excluded from backups (discouraged)
    AlwaysDeviceOnly,
}

impl AccessPolicy {
    /// The policy actually applied on write. Modern platforms removed the
    /// always-readable attribute, so the discouraged variants are downgraded
    /// to their after-first-unlock counterparts.
    pub fn effective(self) -> Self {
        match self {
            Self::Always => Self::AfterFirstUnlock,
            Self::AlwaysDeviceOnly => Self::AfterFirstUnlockDeviceOnly,
            other => other,
        }
    }

    /// Stable label used in log output and by backends that record policies.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AfterFirstUnlock => "after-first-unlock",
            Self::AfterFirstUnlockDeviceOnly => "after-first-unlock-device-only",
            Self::WhenUnlocked => "when-unlocked",
            Self::WhenUnlockedDeviceOnly => "when-unlocked-device-only",
            Self::WhenPasscodeSetDeviceOnly => "when-passcode-set-device-only",
            Self::Always => "always",
            Self::AlwaysDeviceOnly => "always-device-only",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        assert_eq!(AccessPolicy::default(), AccessPolicy::AfterFirstUnlock);
    }

    #[test]
    fn test_discouraged_policies_downgrade() {
        assert_eq!(AccessPolicy::Always.effective(), AccessPolicy::AfterFirstUnlock);
        assert_eq!(
            AccessPolicy::AlwaysDeviceOnly.effective(),
            AccessPolicy::AfterFirstUnlockDeviceOnly
        );
        assert_eq!(
            AccessPolicy::WhenPasscodeSetDeviceOnly.effective(),
            AccessPolicy::WhenPasscodeSetDeviceOnly
        );
    }

    #[test]
    fn test_labels_are_kebab_case() {
        assert_eq!(AccessPolicy::WhenUnlockedDeviceOnly.as_str(), "when-unlocked-device-only");
    }
}
