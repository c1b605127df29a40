//! Server health and readiness reports.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::response::{ApiResponse, StatusCode};

/// Answer of the `health/` and `ready/` endpoints.
///
/// The server sends the same shape for a healthy and a failing check; only
/// the status code differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// `healthy`, `unhealthy`, `ready`, `not ready` or `error`.
    pub status: String,
    /// Per-component results, when the server reports them.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub checks: Map<String, Value>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    /// Reads a health answer. Bodies that are not a report fall back to the
    /// status line.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Self {
        response.json_body().unwrap_or_else(|_| Self {
            status: status_word(response.status),
            checks: Map::new(),
            error: None,
        })
    }

    /// Returns true for a passing check.
    #[must_use]
    pub fn is_up(&self) -> bool {
        matches!(self.status.as_str(), "healthy" | "ready")
    }
}

fn status_word(status: StatusCode) -> String {
    if status.is_success() {
        "healthy".to_string()
    } else {
        status.reason_phrase().to_lowercase()
    }
}
