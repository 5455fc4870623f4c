//! Server-level error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rankr_common::RankrError;
use thiserror::Error;

use crate::api::ErrorResponse;

/// Errors raised outside the feature slices
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage unavailable: {0}")]
    Unavailable(#[from] RankrError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unavailable(ref e) => {
                tracing::error!("Health check failed: {}", e);
                ErrorResponse::new("SERVICE_UNAVAILABLE", "Storage is unavailable")
                    .into_response_with(StatusCode::SERVICE_UNAVAILABLE)
            },
        }
    }
}
