//! Request and response bodies of the authentication endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AccessToken, RefreshToken, TokenPair};
use crate::user::{User, UserType};

/// Username and password submitted at login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account user name.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// New account submitted to `users/register/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password, at least eight characters.
    pub password: String,
    /// Must repeat `password`.
    pub password_confirm: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Account role.
    pub user_type: UserType,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl Registration {
    /// Creates a registration with the password confirmed.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        user_type: UserType,
    ) -> Self {
        let password = password.into();
        Self {
            username: username.into(),
            email: email.into(),
            password_confirm: password.clone(),
            password,
            first_name: String::new(),
            last_name: String::new(),
            user_type,
            phone_number: None,
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("user_type", &self.user_type)
            .finish_non_exhaustive()
    }
}

/// Body of `POST token/refresh/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// The stored refresh token.
    pub refresh: RefreshToken,
}

/// Successful answer of `POST token/refresh/`.
///
/// The server rotates refresh tokens, so a new one may come back alongside
/// the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token.
    pub access: AccessToken,
    /// Rotated refresh token, when the server issues one.
    #[serde(default)]
    pub refresh: Option<RefreshToken>,
}

/// Body of `POST users/logout/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Refresh token to blacklist server-side.
    pub refresh_token: RefreshToken,
}

/// Successful answer of the login endpoint.
///
/// `users/login/` nests the pair under `tokens`; `token/` returns it flat
/// without a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    /// `{ "user": {...}, "tokens": { "access": ..., "refresh": ... } }`
    Nested {
        /// Logged-in user.
        user: User,
        /// Minted tokens.
        tokens: TokenPair,
    },
    /// `{ "access": ..., "refresh": ..., "user"?: {...} }`
    Flat {
        /// Access token.
        access: AccessToken,
        /// Refresh token.
        refresh: RefreshToken,
        /// Logged-in user, when included.
        #[serde(default)]
        user: Option<User>,
    },
}

impl LoginResponse {
    /// Splits the response into the token pair and the optional user.
    #[must_use]
    pub fn into_parts(self) -> (TokenPair, Option<User>) {
        match self {
            Self::Nested { user, tokens } => (tokens, Some(user)),
            Self::Flat {
                access,
                refresh,
                user,
            } => (TokenPair { access, refresh }, user),
        }
    }
}
