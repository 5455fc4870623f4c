use axum::body::Body;
use futures::TryStreamExt;
use rankr_import::{ImportError, ImportSummary, RecordErrors, UserService};
use serde::Serialize;
use std::io;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

/// Result of an import that ran to the end of its input
///
/// `record_errors` is empty when every record was stored.
#[derive(Debug, Clone, Serialize)]
pub struct ImportUsersResponse {
    pub summary: ImportSummary,
    #[serde(skip)]
    pub record_errors: RecordErrors,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportUsersError {
    #[error("Malformed import payload: {source}")]
    Malformed {
        summary: ImportSummary,
        source: serde_json::Error,
    },
    #[error("Import cancelled: server is shutting down")]
    Cancelled { summary: ImportSummary },
    #[error("Import failed: {source}")]
    Internal {
        summary: ImportSummary,
        source: ImportError,
    },
}

impl ImportUsersError {
    pub fn summary(&self) -> &ImportSummary {
        match self {
            Self::Malformed { summary, .. }
            | Self::Cancelled { summary }
            | Self::Internal { summary, .. } => summary,
        }
    }
}

/// Stream `body` through the import pipeline
///
/// The body is never buffered whole; the pipeline pulls it as it decodes.
#[tracing::instrument(skip_all)]
pub async fn handle(
    service: &UserService,
    shutdown: &CancellationToken,
    body: Body,
) -> Result<ImportUsersResponse, ImportUsersError> {
    let reader = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
    let outcome = service.import(shutdown, reader).await;
    let summary = outcome.summary;

    match outcome.error {
        None => Ok(ImportUsersResponse {
            summary,
            record_errors: RecordErrors::default(),
        }),
        Some(ImportError::Records(record_errors)) => Ok(ImportUsersResponse {
            summary,
            record_errors,
        }),
        Some(ImportError::Decode(source)) => Err(ImportUsersError::Malformed { summary, source }),
        Some(ImportError::Cancelled) => Err(ImportUsersError::Cancelled { summary }),
        Some(source) => Err(ImportUsersError::Internal { summary, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankr_import::{DefaultValidator, ImportOptions, InMemoryUserRepository};
    use std::sync::Arc;

    fn service() -> UserService {
        UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(DefaultValidator::new()),
            ImportOptions::new(2, 4, 0),
        )
    }

    #[tokio::test]
    async fn test_clean_import() {
        let body = Body::from(r#"[{"id":1,"name":"a"},{"id":2,"name":"b"}]"#);
        let response = handle(&service(), &CancellationToken::new(), body).await.unwrap();
        assert_eq!(response.summary.successful, 2);
        assert!(response.record_errors.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let body = Body::from(r#"{"id":1,"name":"a"} {"id":"#);
        let err = handle(&service(), &CancellationToken::new(), body).await.unwrap_err();
        assert!(matches!(err, ImportUsersError::Malformed { .. }));
        assert_eq!(err.summary().total, 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_import() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let err = handle(&service(), &shutdown, Body::from(r#"{"id":1,"name":"a"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, ImportUsersError::Cancelled { .. }));
    }
}
