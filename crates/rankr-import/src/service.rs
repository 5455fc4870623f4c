//! User service: the entry point shared by the HTTP server and the CLI.

use rankr_common::RankrError;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::config::ImportOptions;
use crate::models::{User, UserId};
use crate::pipeline::ImportPipeline;
use crate::repository::UserRepository;
use crate::summary::{ImportError, ImportOutcome, ImportSummary};
use crate::validator::{RecordValidator, ValidationError};

#[derive(Debug, Clone, Serialize)]
pub struct GetUserResponse {
    pub user: User,
}

#[derive(Debug, Error)]
pub enum GetUserError {
    #[error(transparent)]
    InvalidId(#[from] ValidationError),

    #[error("user {0} not found")]
    NotFound(UserId),

    #[error("failed to load user: {0}")]
    Repository(RankrError),
}

/// Imports and lookups over one repository
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    validator: Arc<dyn RecordValidator>,
    pipeline: ImportPipeline,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        validator: Arc<dyn RecordValidator>,
        options: ImportOptions,
    ) -> Self {
        let pipeline = ImportPipeline::new(Arc::clone(&repository), Arc::clone(&validator), options);
        Self {
            repository,
            validator,
            pipeline,
        }
    }

    pub fn repository(&self) -> &Arc<dyn UserRepository> {
        &self.repository
    }

    pub fn options(&self) -> &ImportOptions {
        self.pipeline.options()
    }

    /// Stream-import users from `reader`
    pub async fn import<R>(&self, cancel: &CancellationToken, reader: R) -> ImportOutcome
    where
        R: AsyncRead + Send + 'static,
    {
        self.pipeline.run(cancel, reader).await
    }

    /// Open `path` and import it
    ///
    /// A file that cannot be opened yields an empty summary and
    /// [`ImportError::Io`].
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn import_file(
        &self,
        cancel: &CancellationToken,
        path: impl AsRef<Path>,
    ) -> ImportOutcome {
        match tokio::fs::File::open(path.as_ref()).await {
            Ok(file) => self.import(cancel, file).await,
            Err(e) => ImportOutcome {
                summary: ImportSummary::default(),
                error: Some(ImportError::Io(e)),
            },
        }
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: UserId) -> Result<GetUserResponse, GetUserError> {
        self.validator.validate_user_id(id)?;

        let user = self.repository.get_by_id(id).await.map_err(|e| match e {
            RankrError::UserNotFound(missing) => GetUserError::NotFound(missing),
            other => GetUserError::Repository(other),
        })?;

        info!(user_id = id, addresses = user.addresses.len(), "Loaded user");
        Ok(GetUserResponse { user })
    }
}
