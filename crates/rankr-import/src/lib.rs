//! Rankr Import Library
//!
//! Streaming import of user records from JSON into a [`UserRepository`].
//!
//! # Overview
//!
//! - **Framing**: a stream is a JSON array or back-to-back JSON objects,
//!   detected from the first significant byte
//! - **Decoding**: records are decoded one at a time; the first malformed
//!   record stops the run
//! - **Pipeline**: a bounded queue feeds a pool of at most ten workers that
//!   validate and persist records concurrently
//! - **Results**: an [`ImportSummary`] with counts, plus one combined error
//!   for per-record failures
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rankr_import::{DefaultValidator, ImportOptions, InMemoryUserRepository, UserService};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = UserService::new(
//!         Arc::new(InMemoryUserRepository::new()),
//!         Arc::new(DefaultValidator::new()),
//!         ImportOptions::from_env(),
//!     );
//!
//!     let outcome = service.import_file(&CancellationToken::new(), "users.json").await;
//!     println!("{}", serde_json::to_string(&outcome.summary)?);
//!     outcome.into_result()?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod decoder;
pub mod framing;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod service;
pub mod summary;
pub mod tally;
pub mod validator;

pub use config::ImportOptions;
pub use decoder::{DecodeError, RecordDecoder};
pub use framing::Framing;
pub use models::{Address, ImportAddress, ImportUser, NumericId, User, UserId};
pub use pipeline::ImportPipeline;
pub use repository::{InMemoryUserRepository, UserRepository};
#[cfg(feature = "database")]
pub use repository::PgUserRepository;
pub use service::{GetUserError, GetUserResponse, UserService};
pub use summary::{ImportError, ImportOutcome, ImportSummary, RecordError, RecordErrorKind, RecordErrors};
pub use validator::{DefaultValidator, RecordValidator, ValidationError};
