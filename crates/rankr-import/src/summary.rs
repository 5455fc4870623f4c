//! Import results: the summary, per-record failures and the run error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::decoder::DecodeError;
use crate::models::UserId;

/// Counts for one import run
///
/// `duration` is serialized as integer nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub suppressed_errors: u64,
    #[serde(with = "duration_nanos")]
    pub duration: Duration,
}

/// Where in the worker a record failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordErrorKind {
    Validation,
    Persistence,
}

/// One failed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    pub kind: RecordErrorKind,
    pub user_id: UserId,
    pub message: String,
}

impl RecordError {
    pub fn validation(user_id: UserId, err: impl fmt::Display) -> Self {
        Self {
            kind: RecordErrorKind::Validation,
            user_id,
            message: err.to_string(),
        }
    }

    pub fn persistence(user_id: UserId, err: impl fmt::Display) -> Self {
        Self {
            kind: RecordErrorKind::Persistence,
            user_id,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RecordErrorKind::Validation => write!(f, "{}", self.message),
            RecordErrorKind::Persistence => {
                write!(f, "failed to persist user {}: {}", self.user_id, self.message)
            }
        }
    }
}

/// Every per-record failure of a run, collapsed into one error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordErrors {
    pub errors: Vec<RecordError>,
    pub suppressed: u64,
}

impl RecordErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.suppressed == 0
    }

    /// Failures reported, kept or not
    pub fn count(&self) -> u64 {
        self.errors.len() as u64 + self.suppressed
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for RecordErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} record(s) failed: ", self.count())?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        if self.suppressed > 0 {
            write!(f, " (+{} errors suppressed)", self.suppressed)?;
        }
        Ok(())
    }
}

impl std::error::Error for RecordErrors {}

/// Why an import run did not finish cleanly
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to open import source: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode import stream: {0}")]
    Decode(serde_json::Error),

    #[error("import cancelled")]
    Cancelled,

    #[error(transparent)]
    Records(RecordErrors),

    #[error("import task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<DecodeError> for ImportError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Cancelled => ImportError::Cancelled,
            DecodeError::Malformed(e) => ImportError::Decode(e),
        }
    }
}

impl ImportError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ImportError::Cancelled)
    }
}

/// Summary plus the run error, if any
///
/// The summary is meaningful even when `error` is set: it holds the counts
/// reached before the run stopped.
#[derive(Debug)]
pub struct ImportOutcome {
    pub summary: ImportSummary,
    pub error: Option<ImportError>,
}

impl ImportOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<ImportSummary, ImportError> {
        match self.error {
            None => Ok(self.summary),
            Some(err) => Err(err),
        }
    }
}

mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_nanos)
    }
}
