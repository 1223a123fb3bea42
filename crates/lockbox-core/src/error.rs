//! Error types for lockbox-core

use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(#[source] serde_json::Error),

    #[error("decoding failed: {0}")]
    DecodingFailed(#[source] serde_json::Error),

    #[error("secure store failure: {0}")]
    Backend(#[source] keyring::Error),

    #[error("access denied")]
    AccessDenied,

    #[error("stored record holds invalid data")]
    InvalidData,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl StorageError {
    /// A recovery hint for the variants where one applies.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ItemNotFound(_) => Some("check that a value was saved under this key"),
            Self::Backend(_) => Some("unlock the device or restart the application"),
            Self::AccessDenied => Some("check the required permissions"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_key() {
        let err = StorageError::ItemNotFound("session.token".to_string());
        assert_eq!(err.to_string(), "item not found: session.token");
    }

    #[test]
    fn test_recovery_suggestions() {
        assert!(StorageError::AccessDenied.recovery_suggestion().is_some());
        assert!(StorageError::InvalidData.recovery_suggestion().is_none());
        assert!(StorageError::Backend(keyring::Error::NoEntry)
            .recovery_suggestion()
            .is_some());
    }
}
