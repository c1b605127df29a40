//! HTTP Client port

use async_trait::async_trait;
use pms_domain::{ApiRequest, ApiResponse};

/// Transport-level failures: the server never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpClientError {
    /// The URL could not be built from the base URL and request path.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// Host name resolution failed.
    #[error("could not resolve {host}: {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Any other connection failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request body could not be encoded.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Anything else reported by the transport.
    #[error("{0}")]
    Other(String),
}

impl HttpClientError {
    /// Returns true if the failure means the server could not be reached.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::DnsError { .. } | Self::ConnectionRefused { .. } | Self::ConnectionFailed(_)
        )
    }
}

/// Port for executing HTTP requests.
///
/// Implementations resolve `request.path` against their configured API base
/// URL, send the request exactly as described, and return whatever response
/// the server produced, including error statuses. Only transport failures
/// are reported as `Err`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes an HTTP request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received: network issues,
    /// timeout, or a request that could not be encoded.
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError>;
}
