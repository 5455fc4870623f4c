pub mod get;

pub use get::{GetUserQuery, GetUserQueryError};
