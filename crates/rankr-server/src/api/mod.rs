//! HTTP API building blocks shared by feature routes

pub mod response;

pub use response::{ApiResponse, ErrorResponse};
