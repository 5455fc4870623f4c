//! Error types for Rankr

use thiserror::Error;

/// Result type alias for Rankr storage operations
pub type Result<T> = std::result::Result<T, RankrError>;

/// Main error type shared by the storage adapters
#[derive(Error, Debug)]
pub enum RankrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("User not found: {0}")]
    UserNotFound(u64),

    #[error("Invalid user id: {0}")]
    InvalidId(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl RankrError {
    /// True when the error means the requested user does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, RankrError::UserNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(RankrError::UserNotFound(7).is_not_found());
        assert!(!RankrError::Database("down".to_string()).is_not_found());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(RankrError::UserNotFound(42).to_string(), "User not found: 42");
        assert_eq!(
            RankrError::InvalidId("id must be greater than zero".to_string()).to_string(),
            "Invalid user id: id must be greater than zero"
        );
    }
}
