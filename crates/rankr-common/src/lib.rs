//! Rankr Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the Rankr workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`RankrError`] and the [`Result`] alias used at storage boundaries
//! - **Logging**: structured `tracing` setup shared by the server and the CLI
//!
//! # Example
//!
//! ```no_run
//! use rankr_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{RankrError, Result};
