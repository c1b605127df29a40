//! API request descriptor

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AUTHORIZATION, Headers, HttpMethod, RequestBody};

/// Description of a single REST call against the API base URL.
///
/// The path is relative (`"properties/"`, `"leases/12/renew/"`) and is joined
/// to the configured base URL by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Correlation identifier, sent as `X-Request-ID`.
    pub id: Uuid,
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the API base URL
    pub path: String,
    /// Query string pairs
    #[serde(default)]
    pub query: Vec<(String, String)>,
    /// HTTP headers
    #[serde(default)]
    pub headers: Headers,
    /// Request body
    #[serde(default)]
    pub body: RequestBody,
}

impl ApiRequest {
    /// Creates a request with no body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: RequestBody::Empty,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Creates a PATCH request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Replaces the query string pairs.
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Sets a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Sets `Authorization: Bearer <token>`, replacing any previous value.
    pub fn set_bearer(&mut self, token: &str) {
        self.headers.set(AUTHORIZATION, format!("Bearer {token}"));
    }

    /// Removes the Authorization header.
    pub fn clear_bearer(&mut self) {
        self.headers.remove(AUTHORIZATION);
    }

    /// Returns the bearer token currently attached, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builders_set_method_and_path() {
        let req = ApiRequest::patch("tenants/4/");
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "tenants/4/");
        assert!(req.body.is_empty());
    }

    #[test]
    fn bearer_is_replaced_not_appended() {
        let mut req = ApiRequest::get("properties/");
        assert_eq!(req.bearer(), None);

        req.set_bearer("tok1");
        req.set_bearer("tok2");
        assert_eq!(req.bearer(), Some("tok2"));
        assert_eq!(req.headers.len(), 1);

        req.clear_bearer();
        assert_eq!(req.bearer(), None);
    }
}
