//! API response types

mod error_body;
mod spec;

pub use error_body::ApiErrorBody;
pub use spec::{ApiResponse, StatusCode};
