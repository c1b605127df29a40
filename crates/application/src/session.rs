//! Login, registration, logout and the current user.

use pms_domain::{
    ApiRequest, Credentials, LoginResponse, LogoutRequest, Registration, SessionEvent,
    TerminationReason, User,
};
use tracing::{info, warn};

use crate::client::{AuthenticatedClient, decode, json_body};
use crate::error::ApiResult;

/// Login endpoint.
pub const LOGIN_PATH: &str = "users/login/";
/// Account creation; answers like login.
pub const REGISTER_PATH: &str = "users/register/";
/// Logout endpoint; blacklists the refresh token server-side.
pub const LOGOUT_PATH: &str = "users/logout/";
/// Profile of the logged-in user.
pub const CURRENT_USER_PATH: &str = "users/me/";

/// Starts and ends sessions on top of an [`AuthenticatedClient`].
#[derive(Debug, Clone)]
pub struct SessionService {
    client: AuthenticatedClient,
}

impl SessionService {
    /// Creates a service sharing `client`'s token store and events.
    #[must_use]
    pub const fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    /// Exchanges credentials for a token pair and stores it.
    ///
    /// Accepts both login answer shapes the server has used. When the answer
    /// carries no user, the profile is fetched with the new token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for rejected credentials, or
    /// `ApiError::TokenStore` if the tokens cannot be stored.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<User> {
        let request = ApiRequest::post(LOGIN_PATH).with_body(json_body(credentials)?);
        let user = self.start_session(request).await?;
        info!(username = %user.username, "logged in");
        Ok(user)
    }

    /// Creates an account and signs in as it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with per-field messages when the server
    /// rejects the registration, or `ApiError::TokenStore` if the tokens
    /// cannot be stored.
    pub async fn register(&self, registration: &Registration) -> ApiResult<User> {
        let request = ApiRequest::post(REGISTER_PATH).with_body(json_body(registration)?);
        let user = self.start_session(request).await?;
        info!(username = %user.username, "account registered");
        Ok(user)
    }

    /// Ends the session locally and, best effort, on the server.
    ///
    /// Local tokens are cleared whatever the server answers.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local tokens cannot be removed.
    pub async fn logout(&self) -> ApiResult<()> {
        if let Some(refresh_token) = self.client.token_store().refresh_token() {
            let body = json_body(&LogoutRequest { refresh_token })?;
            if let Err(error) = self
                .client
                .send(ApiRequest::post(LOGOUT_PATH).with_body(body))
                .await
            {
                warn!(%error, "server-side logout failed");
            }
        }

        let cleared = self.client.refresh_coordinator().end_session().await;
        self.client.events().publish(SessionEvent::Terminated {
            reason: TerminationReason::Logout,
        });
        info!("logged out");
        cleared.map_err(Into::into)
    }

    /// Fetches the logged-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session has ended.
    pub async fn current_user(&self) -> ApiResult<User> {
        self.client.get_json(CURRENT_USER_PATH).await
    }

    /// Returns true while an access token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.client.token_store().access_token().is_some()
    }

    /// Sends a credential request that mints tokens and switches to them.
    async fn start_session(&self, request: ApiRequest) -> ApiResult<User> {
        let response = self.client.send_public(request).await?;
        let (tokens, user) = decode::<LoginResponse>(&response)?.into_parts();

        self.client
            .refresh_coordinator()
            .begin_session(tokens)
            .await
            .inspect_err(|error| warn!(%error, "could not store session tokens"))?;

        let user = match user {
            Some(user) => user,
            None => self.current_user().await?,
        };
        self.client.events().publish(SessionEvent::LoggedIn {
            username: user.username.clone(),
        });
        Ok(user)
    }
}
