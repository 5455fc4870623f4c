//! Persistence port for users
//!
//! The import pipeline and the lookup path only see [`UserRepository`].
//! Adapters:
//!
//! - [`InMemoryUserRepository`]: process-local map, used for dry runs and tests
//! - `PgUserRepository`: PostgreSQL, behind the `database` feature

use async_trait::async_trait;
use rankr_common::Result;

use crate::models::{User, UserId};

pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::InMemoryUserRepository;
#[cfg(feature = "database")]
pub use postgres::PgUserRepository;

/// Storage for users and their addresses
///
/// Implementations are shared by every import worker and must tolerate
/// concurrent calls.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or fully replace a user, addresses included
    ///
    /// Writing the same user twice leaves the same stored state.
    async fn upsert_user(&self, user: User) -> Result<()>;

    /// Fetch a user; `RankrError::UserNotFound` when absent
    async fn get_by_id(&self, id: UserId) -> Result<User>;

    /// Check the backing store is reachable
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
