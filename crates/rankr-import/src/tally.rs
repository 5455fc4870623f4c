//! Shared result state for the worker pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::summary::{RecordError, RecordErrors};

/// Bounded store for per-record error details
///
/// Keeps the first `capacity` details and counts the rest. Reporting never
/// waits on anything but a short critical section.
#[derive(Debug)]
pub struct ErrorCollector {
    capacity: usize,
    entries: Mutex<Vec<RecordError>>,
    suppressed: AtomicU64,
}

impl ErrorCollector {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(Vec::with_capacity(capacity.min(64))),
            suppressed: AtomicU64::new(0),
        }
    }

    /// Record a failure; returns `false` when the detail was dropped
    pub fn report(&self, err: RecordError) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() < self.capacity {
            entries.push(err);
            true
        } else {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    pub fn suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    /// Move everything collected so far out of the collector
    pub fn take(&self) -> RecordErrors {
        let errors = std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner));
        RecordErrors {
            errors,
            suppressed: self.suppressed.swap(0, Ordering::Relaxed),
        }
    }
}

/// Counters plus error collector, shared by the producer and every worker
#[derive(Debug)]
pub struct ImportTally {
    queued: AtomicU64,
    successful: AtomicU64,
    errors: ErrorCollector,
}

impl ImportTally {
    pub fn new(error_capacity: usize) -> Self {
        Self {
            queued: AtomicU64::new(0),
            successful: AtomicU64::new(0),
            errors: ErrorCollector::new(error_capacity),
        }
    }

    pub fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::Relaxed)
    }

    pub fn record_success(&self) {
        self.successful.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, err: RecordError) -> bool {
        self.errors.report(err)
    }

    pub fn successful(&self) -> u64 {
        self.successful.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> &ErrorCollector {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_collector_keeps_first_details() {
        let collector = ErrorCollector::new(2);
        assert!(collector.report(RecordError::persistence(1, "a")));
        assert!(collector.report(RecordError::persistence(2, "b")));
        assert!(!collector.report(RecordError::persistence(3, "c")));
        assert_eq!(collector.suppressed(), 1);

        let taken = collector.take();
        let ids: Vec<u64> = taken.errors.iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(taken.suppressed, 1);
        assert_eq!(taken.count(), 3);
    }

    #[test]
    fn test_zero_capacity_suppresses_everything() {
        let collector = ErrorCollector::new(0);
        assert!(!collector.report(RecordError::persistence(1, "a")));
        let taken = collector.take();
        assert!(taken.errors.is_empty());
        assert_eq!(taken.suppressed, 1);
    }

    #[test]
    fn test_concurrent_reporting_loses_nothing() {
        let tally = Arc::new(ImportTally::new(5));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let tally = Arc::clone(&tally);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        if i % 2 == 0 {
                            tally.record_success();
                        } else {
                            tally.record_failure(RecordError::persistence(t * 1000 + i, "boom"));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tally.successful(), 400);
        let errors = tally.errors().take();
        assert_eq!(errors.errors.len(), 5);
        assert_eq!(errors.count(), 400);
    }
}
