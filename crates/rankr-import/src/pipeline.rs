//! Streaming import pipeline
//!
//! One producer decodes the stream on a blocking thread and feeds a bounded
//! queue; up to [`MAX_WORKERS`](crate::config::MAX_WORKERS) async workers
//! validate and persist records from it. A full queue blocks the producer,
//! so memory stays bounded by the queue size whatever the stream length.
//!
//! ```text
//! reader ──► RecordDecoder ──► mpsc(queue_size) ──► worker × N ──► UserRepository
//!                                                        │
//!                                                        ▼
//!                                                   ImportTally
//! ```

use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::time::Instant;

use tokio::io::AsyncRead;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::io::SyncIoBridge;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::ImportOptions;
use crate::decoder::{DecodeError, RecordDecoder};
use crate::models::{ImportUser, User};
use crate::repository::UserRepository;
use crate::summary::{ImportError, ImportOutcome, ImportSummary, RecordError};
use crate::tally::ImportTally;
use crate::validator::RecordValidator;

type SharedQueue = Arc<Mutex<mpsc::Receiver<ImportUser>>>;

/// Runs imports against one repository and validator
#[derive(Clone)]
pub struct ImportPipeline {
    repository: Arc<dyn UserRepository>,
    validator: Arc<dyn RecordValidator>,
    options: ImportOptions,
}

impl ImportPipeline {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        validator: Arc<dyn RecordValidator>,
        options: ImportOptions,
    ) -> Self {
        Self {
            repository,
            validator,
            options,
        }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Import every record in `reader`
    ///
    /// Never returns before every worker has stopped. The summary is always
    /// filled in; `error` is, in order of precedence, a fatal decode error or
    /// cancellation, a panicked task, or the combined per-record failures.
    ///
    /// Cancelling `cancel` stops decoding before the next record and stops
    /// workers at their next take; persistence calls already running finish.
    #[instrument(
        name = "import",
        skip_all,
        fields(max_workers = self.options.max_workers(), queue_size = self.options.queue_size())
    )]
    pub async fn run<R>(&self, cancel: &CancellationToken, reader: R) -> ImportOutcome
    where
        R: AsyncRead + Send + 'static,
    {
        let started = Instant::now();
        info!("Starting import");

        // Cancelled on return, or when this future is dropped mid-run.
        let token = cancel.child_token();
        let _abort_on_exit = token.clone().drop_guard();

        let tally = Arc::new(ImportTally::new(self.options.error_capacity()));
        let (sender, receiver) = mpsc::channel(self.options.queue_size());
        let queue: SharedQueue = Arc::new(Mutex::new(receiver));

        let mut workers = JoinSet::new();
        for worker_id in 0..self.options.max_workers() {
            workers.spawn(work(
                worker_id,
                Arc::clone(&queue),
                token.clone(),
                Arc::clone(&self.repository),
                Arc::clone(&self.validator),
                Arc::clone(&tally),
            ));
        }
        // Only workers hold the receiver now; once they all stop, a blocked
        // producer's send fails instead of waiting forever.
        drop(queue);

        let bridge = SyncIoBridge::new(Box::pin(reader));
        let producer = {
            let token = token.clone();
            let tally = Arc::clone(&tally);
            tokio::task::spawn_blocking(move || feed(BufReader::new(bridge), sender, &token, &tally))
        };

        let mut error = match producer.await {
            Ok(feed_error) => feed_error.map(ImportError::from),
            Err(e) => Some(ImportError::Task(e)),
        };

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Import worker failed");
                if error.is_none() {
                    error = Some(ImportError::Task(e));
                }
            }
        }

        let record_errors = tally.errors().take();
        let total = tally.queued();
        let successful = tally.successful();

        // Records still queued when the caller cancelled count as failed.
        let abandoned = total.saturating_sub(successful + record_errors.count());
        if error.is_none() && abandoned > 0 && cancel.is_cancelled() {
            error = Some(ImportError::Cancelled);
        }

        let summary = ImportSummary {
            total,
            successful,
            failed: total.saturating_sub(successful),
            suppressed_errors: record_errors.suppressed,
            duration: started.elapsed(),
        };

        if !record_errors.is_empty() {
            warn!(failures = record_errors.count(), "import completed with errors");
            if let Some(fatal) = &error {
                warn!(
                    error = %fatal,
                    hidden = %record_errors,
                    "Fatal import error takes precedence over record failures"
                );
            }
            if error.is_none() {
                error = Some(ImportError::Records(record_errors));
            }
        }

        info!(
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            suppressed_errors = summary.suppressed_errors,
            duration_ms = summary.duration.as_millis() as u64,
            "Import finished"
        );

        ImportOutcome { summary, error }
    }
}

/// Decode records into the queue until the input ends or decoding stops
fn feed<R: BufRead>(
    reader: R,
    queue: mpsc::Sender<ImportUser>,
    cancel: &CancellationToken,
    tally: &ImportTally,
) -> Option<DecodeError> {
    let decoder = match RecordDecoder::new(reader) {
        Ok(decoder) => decoder.with_cancellation(cancel.clone()),
        Err(e) => return Some(e),
    };

    for record in decoder {
        let user = match record {
            Ok(user) => user,
            Err(e) => return Some(e),
        };

        if queue.blocking_send(user).is_err() {
            // every worker is gone
            return cancel.is_cancelled().then_some(DecodeError::Cancelled);
        }
        tally.record_queued();
    }

    None
}

async fn work(
    worker_id: usize,
    queue: SharedQueue,
    cancel: CancellationToken,
    repository: Arc<dyn UserRepository>,
    validator: Arc<dyn RecordValidator>,
    tally: Arc<ImportTally>,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            record = async { queue.lock().await.recv().await } => record,
        };
        let Some(record) = next else {
            break;
        };

        let user_id = record.id.get();
        if let Err(e) = validator.validate_import_user(&record) {
            debug!(worker_id, user_id, error = %e, "Record failed validation");
            tally.record_failure(RecordError::validation(user_id, e));
            continue;
        }

        match repository.upsert_user(User::from(record)).await {
            Ok(()) => tally.record_success(),
            Err(e) => {
                debug!(worker_id, user_id, error = %e, "Failed to persist record");
                tally.record_failure(RecordError::persistence(user_id, e));
            }
        }
    }

    debug!(worker_id, "Import worker stopped");
}
