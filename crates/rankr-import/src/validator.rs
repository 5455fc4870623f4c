//! Record validation
//!
//! The pipeline only needs "validate one record, pass or fail with a
//! reason"; [`RecordValidator`] is that capability. [`DefaultValidator`]
//! carries the rules the service ships with.

use thiserror::Error;

use crate::models::{ImportUser, UserId};

/// Errors produced while validating a user record or id
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid user payload: id is required")]
    IdRequired,

    #[error("invalid user payload: name is required")]
    NameRequired,

    #[error("validation failed: address line is required at index {index}")]
    AddressStreetRequired { index: usize },

    #[error("invalid user id: id must be greater than zero")]
    IdNotPositive,
}

/// Validation capability used by the import pipeline and user lookups
///
/// Implementations must be pure and safe to call from many workers at once.
pub trait RecordValidator: Send + Sync {
    fn validate_import_user(&self, user: &ImportUser) -> Result<(), ValidationError>;

    fn validate_user_id(&self, id: UserId) -> Result<(), ValidationError>;
}

/// Built-in rules: id and name are required, every address needs a street
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl DefaultValidator {
    pub fn new() -> Self {
        Self
    }
}

impl RecordValidator for DefaultValidator {
    fn validate_import_user(&self, user: &ImportUser) -> Result<(), ValidationError> {
        if user.id.get() == 0 {
            return Err(ValidationError::IdRequired);
        }

        if user.name.trim().is_empty() {
            return Err(ValidationError::NameRequired);
        }

        if let Some(index) = user.addresses.iter().position(|a| a.street.is_empty()) {
            return Err(ValidationError::AddressStreetRequired { index });
        }

        Ok(())
    }

    fn validate_user_id(&self, id: UserId) -> Result<(), ValidationError> {
        if id == 0 {
            return Err(ValidationError::IdNotPositive);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImportAddress, NumericId};

    fn user(id: u64, name: &str) -> ImportUser {
        ImportUser {
            id: NumericId::new(id),
            name: name.to_string(),
            ..ImportUser::default()
        }
    }

    #[test]
    fn test_valid_user_passes() {
        assert!(DefaultValidator.validate_import_user(&user(1, "Ada")).is_ok());
    }

    #[test]
    fn test_zero_id_is_required() {
        assert_eq!(
            DefaultValidator.validate_import_user(&user(0, "Ada")),
            Err(ValidationError::IdRequired)
        );
    }

    #[test]
    fn test_blank_name_is_required() {
        assert_eq!(
            DefaultValidator.validate_import_user(&user(1, "   ")),
            Err(ValidationError::NameRequired)
        );
    }

    #[test]
    fn test_address_without_street_reports_index() {
        let mut record = user(1, "Ada");
        record.addresses = vec![
            ImportAddress {
                street: "1 Main St".to_string(),
                ..ImportAddress::default()
            },
            ImportAddress {
                city: "Springfield".to_string(),
                ..ImportAddress::default()
            },
        ];

        let err = DefaultValidator.validate_import_user(&record).unwrap_err();
        assert_eq!(err, ValidationError::AddressStreetRequired { index: 1 });
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_user_id_must_be_positive() {
        assert!(DefaultValidator.validate_user_id(5).is_ok());
        assert_eq!(
            DefaultValidator.validate_user_id(0),
            Err(ValidationError::IdNotPositive)
        );
    }
}
