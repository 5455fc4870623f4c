pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{ImportUsersError, ImportUsersResponse};
pub use queries::{GetUserQuery, GetUserQueryError};
pub use routes::users_routes;
