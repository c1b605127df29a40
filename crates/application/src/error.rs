//! Application error types

use pms_domain::{ApiErrorBody, ApiResponse, DomainError, StatusCode};
use thiserror::Error;

use crate::ports::{HttpClientError, TokenStoreError};

/// Errors returned to callers of the API client.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("server responded {status}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Parsed error body.
        body: ApiErrorBody,
    },

    /// No response was received.
    #[error("transport error: {0}")]
    Transport(#[from] HttpClientError),

    /// Tokens could not be persisted.
    #[error("token storage error: {0}")]
    TokenStore(#[from] TokenStoreError),

    /// A success response did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}

impl ApiError {
    /// Builds a `Status` error from a failed response.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Self {
        Self::Status {
            status: response.status,
            body: ApiErrorBody::parse(&response.body),
        }
    }

    /// Returns the HTTP status, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for a 401 answer.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status, .. } if status.is_unauthorized())
    }
}

/// Result type alias for API client operations.
pub type ApiResult<T> = Result<T, ApiError>;
