//! Server health checks.

use pms_domain::{ApiRequest, ServiceHealth};

use crate::client::AuthenticatedClient;
use crate::error::ApiResult;

/// Liveness check; served next to the API root, not under it.
pub const HEALTH_PATH: &str = "../health/";
/// Readiness check.
pub const READY_PATH: &str = "../ready/";

/// Asks the server how it is doing. Needs no session.
#[derive(Debug, Clone)]
pub struct HealthClient {
    client: AuthenticatedClient,
}

impl HealthClient {
    /// Creates a health client.
    #[must_use]
    pub const fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    /// Runs the detailed health check.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the server cannot be reached. A
    /// failing check is a report, not an error.
    pub async fn health(&self) -> ApiResult<ServiceHealth> {
        self.check(HEALTH_PATH).await
    }

    /// Asks whether the server accepts traffic.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the server cannot be reached.
    pub async fn ready(&self) -> ApiResult<ServiceHealth> {
        self.check(READY_PATH).await
    }

    async fn check(&self, path: &str) -> ApiResult<ServiceHealth> {
        let response = self.client.fetch_public(ApiRequest::get(path)).await?;
        Ok(ServiceHealth::from_response(&response))
    }
}
