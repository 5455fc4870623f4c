pub mod import;

pub use import::{ImportUsersError, ImportUsersResponse};
