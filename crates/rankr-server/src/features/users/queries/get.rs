use rankr_import::{GetUserError, GetUserResponse, UserId, UserService};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserQuery {
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetUserQueryError {
    #[error("invalid user id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Lookup(#[from] GetUserError),
}

impl GetUserQuery {
    pub fn validate(&self) -> Result<UserId, GetUserQueryError> {
        let raw = self.id.trim();
        if raw.is_empty() {
            return Err(GetUserQueryError::InvalidId("id is required".to_string()));
        }
        raw.parse::<UserId>()
            .map_err(|e| GetUserQueryError::InvalidId(format!("id must be numeric: {e}")))
    }
}

#[tracing::instrument(skip(service))]
pub async fn handle(
    service: &UserService,
    query: GetUserQuery,
) -> Result<GetUserResponse, GetUserQueryError> {
    let id = query.validate()?;
    Ok(service.get_user(id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(id: &str) -> GetUserQuery {
        GetUserQuery { id: id.to_string() }
    }

    #[test]
    fn test_validation_success() {
        assert_eq!(query("42").validate().unwrap(), 42);
        assert_eq!(query(" 7 ").validate().unwrap(), 7);
    }

    #[test]
    fn test_validation_rejects_non_numeric() {
        assert!(matches!(query("abc").validate(), Err(GetUserQueryError::InvalidId(_))));
        assert!(matches!(query("-1").validate(), Err(GetUserQueryError::InvalidId(_))));
        assert!(matches!(query("").validate(), Err(GetUserQueryError::InvalidId(_))));
    }
}
