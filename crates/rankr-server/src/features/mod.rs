//! Feature slices of the Rankr API
//!
//! Each feature is a vertical slice:
//! - `commands/` - write operations
//! - `queries/` - read operations
//! - `routes.rs` - HTTP route definitions

pub mod users;

use axum::Router;
use rankr_import::UserService;
use tokio_util::sync::CancellationToken;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Imports and lookups over the configured repository
    pub users: UserService,
    /// Cancelled when the server begins shutting down; aborts running imports
    pub shutdown: CancellationToken,
}

/// Creates the API router with all feature routes mounted
///
/// - `/users` - user import and lookup
pub fn router(state: FeatureState, max_import_bytes: usize) -> Router<()> {
    Router::new().nest("/users", users::users_routes(max_import_bytes).with_state(state))
}
