//! Facade configuration

use serde::{Deserialize, Serialize};

/// Default service namespace for secure-store records
pub const DEFAULT_SERVICE: &str = "com.lockbox.storage";

/// Storage configuration, constructed once per facade and immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Secure-store service namespace
    pub service: String,
    /// Secure-store sharing group, for credentials shared across processes
    pub access_group: Option<String>,
    /// Preference suite name, for settings shared across processes
    pub suite_name: Option<String>,
    /// Whether facade operations emit log lines
    pub debug_logging: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            access_group: None,
            suite_name: None,
            debug_logging: false,
        }
    }
}

impl StorageConfig {
    /// Configuration with a custom service namespace
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.service, DEFAULT_SERVICE);
        assert!(config.access_group.is_none());
        assert!(config.suite_name.is_none());
        assert!(!config.debug_logging);
    }

    #[test]
    fn test_with_service() {
        let config = StorageConfig::with_service("com.example.app");
        assert_eq!(config.service, "com.example.app");
        assert!(config.suite_name.is_none());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = StorageConfig {
            service: "com.example.app".to_string(),
            access_group: Some("group.example".to_string()),
            suite_name: Some("shared".to_string()),
            debug_logging: true,
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: StorageConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.service, config.service);
        assert_eq!(back.access_group, config.access_group);
        assert_eq!(back.suite_name, config.suite_name);
        assert!(back.debug_logging);
    }
}
