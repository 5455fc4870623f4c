//! User API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/users/import` - Stream-import users (JSON array or concatenated objects)
//! - `GET /api/v1/users/:id` - Get a single user with addresses

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::FeatureState;
use crate::middleware::body_limit_layer;
use axum::{
    body::Body,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use rankr_import::GetUserError;
use serde_json::json;

use super::{
    commands::ImportUsersError,
    queries::{GetUserQuery, GetUserQueryError},
};

// ============================================================================
// Router Configuration
// ============================================================================

/// Creates the users router; import bodies are capped at `max_import_bytes`
pub fn users_routes(max_import_bytes: usize) -> Router<FeatureState> {
    Router::new()
        .route(
            "/import",
            post(import_users).layer(body_limit_layer(max_import_bytes)),
        )
        .route("/:id", get(get_user))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Import users from the request body
///
/// # Endpoint
///
/// `POST /api/v1/users/import`
///
/// # Response
///
/// - `200 OK` - Stream fully processed; per-record failures, if any, are in
///   `meta.errors` and `meta.suppressed_errors`
/// - `400 Bad Request` - Malformed stream; the partial summary is in `error.details`
/// - `413 Payload Too Large` - Declared body size over the configured limit
/// - `503 Service Unavailable` - Server shutting down mid-import
#[tracing::instrument(skip_all)]
async fn import_users(
    State(state): State<FeatureState>,
    body: Body,
) -> Result<Response, UsersApiError> {
    let response = super::commands::import::handle(&state.users, &state.shutdown, body).await?;

    tracing::info!(
        total = response.summary.total,
        successful = response.summary.successful,
        failed = response.summary.failed,
        "Users imported via API"
    );

    if response.record_errors.is_empty() {
        return Ok(ApiResponse::success(response.summary).into_response());
    }

    let meta = json!({
        "errors": response.record_errors.messages(),
        "suppressed_errors": response.record_errors.suppressed,
    });
    Ok(ApiResponse::success_with_meta(response.summary, meta).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

/// Get a single user by id
///
/// # Endpoint
///
/// `GET /api/v1/users/:id`
///
/// # Response
///
/// - `200 OK` - `{ "user": { ... } }`
/// - `400 Bad Request` - Id is not a positive integer
/// - `404 Not Found` - No such user
/// - `500 Internal Server Error` - Storage error
#[tracing::instrument(skip(state))]
async fn get_user(
    State(state): State<FeatureState>,
    Path(id): Path<String>,
) -> Result<Response, UsersApiError> {
    let response = super::queries::get::handle(&state.users, GetUserQuery { id }).await?;

    tracing::debug!(user_id = response.user.id, "User retrieved via API");

    Ok(ApiResponse::success(response).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for user API endpoints
#[derive(Debug, thiserror::Error)]
enum UsersApiError {
    #[error(transparent)]
    Import(#[from] ImportUsersError),
    #[error(transparent)]
    Get(#[from] GetUserQueryError),
}

impl IntoResponse for UsersApiError {
    fn into_response(self) -> Response {
        match self {
            UsersApiError::Import(ref err) => {
                let details = json!({ "summary": err.summary() });
                let (status, code) = match err {
                    ImportUsersError::Malformed { .. } => {
                        (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
                    },
                    ImportUsersError::Cancelled { .. } => {
                        (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
                    },
                    ImportUsersError::Internal { .. } => {
                        tracing::error!("Import failed: {}", err);
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                    },
                };
                ErrorResponse::with_details(code, self.to_string(), details)
                    .into_response_with(status)
            },

            UsersApiError::Get(GetUserQueryError::InvalidId(_))
            | UsersApiError::Get(GetUserQueryError::Lookup(GetUserError::InvalidId(_))) => {
                ErrorResponse::new("VALIDATION_ERROR", self.to_string())
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            UsersApiError::Get(GetUserQueryError::Lookup(GetUserError::NotFound(_))) => {
                ErrorResponse::new("NOT_FOUND", self.to_string())
                    .into_response_with(StatusCode::NOT_FOUND)
            },
            UsersApiError::Get(GetUserQueryError::Lookup(GetUserError::Repository(_))) => {
                tracing::error!("Database error during user retrieval: {}", self);
                ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = UsersApiError::from(GetUserQueryError::InvalidId("id is required".into()));
        assert_eq!(err.to_string(), "invalid user id: id is required");
    }
}
