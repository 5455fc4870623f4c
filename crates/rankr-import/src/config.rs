//! Import pipeline configuration
//!
//! Out-of-range values are never rejected; they are normalized so a bad
//! environment cannot produce an unbounded worker pool or queue.

use serde::{Deserialize, Serialize};

/// Upper bound (and fallback) for the number of concurrent workers.
pub const MAX_WORKERS: usize = 10;

/// Fallback capacity of the decoded-record queue.
pub const DEFAULT_QUEUE_SIZE: usize = 200;

/// Normalized import settings
///
/// An error capacity that was never set explicitly tracks the worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    max_workers: usize,
    queue_size: usize,
    #[serde(default)]
    error_capacity: Option<usize>,
}

impl ImportOptions {
    /// Build options from raw, possibly out-of-range values
    ///
    /// - `max_workers` outside `1..=10` becomes 10
    /// - `queue_size` of zero or less becomes 200
    /// - `error_capacity` of zero or less becomes twice the worker count
    pub fn new(max_workers: i64, queue_size: i64, error_capacity: i64) -> Self {
        let max_workers = match usize::try_from(max_workers) {
            Ok(n) if (1..=MAX_WORKERS).contains(&n) => n,
            _ => MAX_WORKERS,
        };
        let queue_size = match usize::try_from(queue_size) {
            Ok(n) if n > 0 => n,
            _ => DEFAULT_QUEUE_SIZE,
        };
        let error_capacity = usize::try_from(error_capacity).ok().filter(|n| *n > 0);

        Self {
            max_workers,
            queue_size,
            error_capacity,
        }
    }

    /// Load options from environment variables
    ///
    /// - `IMPORT_MAX_WORKERS`
    /// - `IMPORT_QUEUE_SIZE`
    /// - `IMPORT_ERROR_CAPACITY`
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::new(
            env_int("IMPORT_MAX_WORKERS"),
            env_int("IMPORT_QUEUE_SIZE"),
            env_int("IMPORT_ERROR_CAPACITY"),
        )
    }

    pub fn with_max_workers(self, max_workers: i64) -> Self {
        Self {
            max_workers: Self::new(max_workers, 0, 0).max_workers,
            ..self
        }
    }

    pub fn with_queue_size(self, queue_size: i64) -> Self {
        Self {
            queue_size: Self::new(0, queue_size, 0).queue_size,
            ..self
        }
    }

    /// Zero or less goes back to twice the worker count
    pub fn with_error_capacity(self, error_capacity: i64) -> Self {
        Self {
            error_capacity: Self::new(0, 0, error_capacity).error_capacity,
            ..self
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn queue_size(&self) -> usize {
        self.queue_size
    }

    pub fn error_capacity(&self) -> usize {
        self.error_capacity.unwrap_or(self.max_workers * 2)
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

fn env_int(name: &str) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let opts = ImportOptions::default();
        assert_eq!(opts.max_workers(), 10);
        assert_eq!(opts.queue_size(), 200);
        assert_eq!(opts.error_capacity(), 20);
    }

    #[test]
    fn test_worker_count_is_clamped_to_maximum() {
        assert_eq!(ImportOptions::new(-1, 5, 0).max_workers(), 10);
        assert_eq!(ImportOptions::new(0, 5, 0).max_workers(), 10);
        assert_eq!(ImportOptions::new(11, 5, 0).max_workers(), 10);
        assert_eq!(ImportOptions::new(1, 5, 0).max_workers(), 1);
        assert_eq!(ImportOptions::new(10, 5, 0).max_workers(), 10);
    }

    #[test]
    fn test_queue_size_falls_back() {
        assert_eq!(ImportOptions::new(2, -5, 0).queue_size(), 200);
        assert_eq!(ImportOptions::new(2, 0, 0).queue_size(), 200);
        assert_eq!(ImportOptions::new(2, 1, 0).queue_size(), 1);
        assert_eq!(ImportOptions::new(2, 5000, 0).queue_size(), 5000);
    }

    #[test]
    fn test_error_capacity_follows_workers() {
        assert_eq!(ImportOptions::new(3, 1, 0).error_capacity(), 6);
        assert_eq!(ImportOptions::new(3, 1, 50).error_capacity(), 50);
        assert_eq!(ImportOptions::default().with_max_workers(4).error_capacity(), 8);
    }

    #[test]
    fn test_explicit_error_capacity_survives_worker_change() {
        let opts = ImportOptions::new(4, 10, 50).with_max_workers(2);
        assert_eq!(opts.max_workers(), 2);
        assert_eq!(opts.error_capacity(), 50);

        let opts = ImportOptions::new(4, 10, 50).with_error_capacity(0).with_max_workers(3);
        assert_eq!(opts.error_capacity(), 6);
    }

    #[test]
    #[serial]
    fn test_env_error_capacity_survives_cli_overrides() {
        std::env::set_var("IMPORT_ERROR_CAPACITY", "75");

        let opts = ImportOptions::from_env().with_max_workers(5).with_queue_size(40);

        std::env::remove_var("IMPORT_ERROR_CAPACITY");

        assert_eq!(opts.max_workers(), 5);
        assert_eq!(opts.queue_size(), 40);
        assert_eq!(opts.error_capacity(), 75);
    }

    #[test]
    fn test_builder_methods_normalize() {
        let opts = ImportOptions::default().with_max_workers(99).with_queue_size(-2);
        assert_eq!(opts.max_workers(), 10);
        assert_eq!(opts.queue_size(), 200);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("IMPORT_MAX_WORKERS", "4");
        std::env::set_var("IMPORT_QUEUE_SIZE", "not-a-number");
        std::env::remove_var("IMPORT_ERROR_CAPACITY");

        let opts = ImportOptions::from_env();

        std::env::remove_var("IMPORT_MAX_WORKERS");
        std::env::remove_var("IMPORT_QUEUE_SIZE");

        assert_eq!(opts.max_workers(), 4);
        assert_eq!(opts.queue_size(), 200);
        assert_eq!(opts.error_capacity(), 8);
    }
}
