//! Authenticated request layer.
//!
//! Every call made by the console goes through [`AuthenticatedClient`]. It
//! attaches the stored bearer token, and on a 401 it obtains a fresh token
//! through the [`RefreshCoordinator`] and re-issues the request once.

use std::sync::Arc;

use pms_domain::request::REQUEST_ID;
use pms_domain::{AccessToken, ApiRequest, ApiResponse, RequestBody};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{RefreshCoordinator, RefreshError, SessionEvents};
use crate::error::{ApiError, ApiResult};
use crate::ports::{HttpClient, TokenStore};

/// HTTP client that manages bearer tokens for its callers.
///
/// Cloning is cheap; clones share the token store and refresh state.
#[derive(Clone)]
pub struct AuthenticatedClient {
    http: Arc<dyn HttpClient>,
    store: Arc<dyn TokenStore>,
    events: SessionEvents,
    refresh: RefreshCoordinator,
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}

impl AuthenticatedClient {
    /// Creates a client over `http`, reading and writing tokens in `store`.
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>, store: Arc<dyn TokenStore>, events: SessionEvents) -> Self {
        let refresh = RefreshCoordinator::new(Arc::clone(&http), Arc::clone(&store), events.clone());
        Self {
            http,
            store,
            events,
            refresh,
        }
    }

    /// Returns the token store.
    #[must_use]
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Returns the session event channel.
    #[must_use]
    pub const fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Returns the refresh coordinator.
    #[must_use]
    pub const fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    /// Sends a request with the current access token.
    ///
    /// A 401 answer triggers one refresh and one retry. The retry's outcome
    /// is returned as is; if the refresh fails the original 401 is returned.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for any non-2xx answer and
    /// `ApiError::Transport` when no answer was received.
    pub async fn send(&self, mut request: ApiRequest) -> ApiResult<ApiResponse> {
        let sent = self.authorize(&mut request);
        let response = self.dispatch(&request).await?;
        if !response.status.is_unauthorized() {
            return check(response);
        }

        let original = ApiError::from_response(&response);
        let Some(token) = self.replacement_token(sent.as_ref()).await else {
            return Err(original);
        };

        request.set_bearer(token.as_str());
        debug!(request_id = %request.id, path = %request.path, "retrying with new access token");
        check(self.dispatch(&request).await?)
    }

    /// Sends a request without credentials and without refresh handling.
    ///
    /// Used for login, where a 401 means wrong credentials.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for any non-2xx answer and
    /// `ApiError::Transport` when no answer was received.
    pub async fn send_public(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        check(self.fetch_public(request).await?)
    }

    /// Sends a request without credentials and returns the answer whatever
    /// its status.
    ///
    /// Health checks use this: their 503 answers still carry a report.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` when no answer was received.
    pub async fn fetch_public(&self, mut request: ApiRequest) -> ApiResult<ApiResponse> {
        request.headers.set(REQUEST_ID, request.id.to_string());
        request.clear_bearer();
        self.dispatch(&request).await
    }

    /// Sends a request and decodes the JSON answer.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send), plus `ApiError::Decode` if the body does
    /// not match `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        decode(&self.send(request).await?)
    }

    /// `GET path` decoded as `T`.
    ///
    /// # Errors
    ///
    /// See [`send_json`](Self::send_json).
    pub async fn get_json<T: DeserializeOwned>(&self, path: impl Into<String>) -> ApiResult<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`send_json`](Self::send_json).
    pub async fn post_json<B, T>(&self, path: impl Into<String>, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::post(path).with_body(json_body(body)?))
            .await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`send_json`](Self::send_json).
    pub async fn patch_json<B, T>(&self, path: impl Into<String>, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::patch(path).with_body(json_body(body)?))
            .await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`send_json`](Self::send_json).
    pub async fn put_json<B, T>(&self, path: impl Into<String>, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::put(path).with_body(json_body(body)?))
            .await
    }

    /// `DELETE path`, ignoring any answer body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn delete(&self, path: impl Into<String>) -> ApiResult<()> {
        self.send(ApiRequest::delete(path)).await.map(drop)
    }

    /// Stamps the request id and the current bearer token. Returns the token
    /// that was attached.
    fn authorize(&self, request: &mut ApiRequest) -> Option<AccessToken> {
        request.headers.set(REQUEST_ID, request.id.to_string());
        let token = self.store.access_token();
        match &token {
            Some(token) => request.set_bearer(token.as_str()),
            None => request.clear_bearer(),
        }
        token
    }

    /// Finds the token to retry a 401 with, or `None` to give up.
    async fn replacement_token(&self, sent: Option<&AccessToken>) -> Option<AccessToken> {
        if let Some(current) = self.store.access_token()
            && sent != Some(&current)
        {
            debug!("access token changed while the request was in flight");
            return Some(current);
        }

        match self.refresh.request_refresh().await {
            Ok(token) => Some(token),
            Err(RefreshError::Superseded) => self.store.access_token(),
            Err(RefreshError::NotLoggedIn) => None,
            Err(error) => {
                warn!(%error, "could not refresh access token");
                None
            }
        }
    }

    async fn dispatch(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            "sending request"
        );
        let response = self.http.execute(request).await?;
        debug!(request_id = %request.id, status = response.status.as_u16(), "response received");
        Ok(response)
    }
}

fn check(response: ApiResponse) -> ApiResult<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ApiError::from_response(&response))
    }
}

pub(crate) fn decode<T: DeserializeOwned>(response: &ApiResponse) -> ApiResult<T> {
    response
        .json_body()
        .map_err(|e| ApiError::Decode(e.to_string()))
}

pub(crate) fn json_body<B: Serialize + ?Sized>(body: &B) -> ApiResult<RequestBody> {
    RequestBody::json(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}
