//! Token store port
//!
//! Holds the current access and refresh tokens. Read by the request layer,
//! written by login and refresh, cleared on logout or failed refresh.

use async_trait::async_trait;
use pms_domain::{AccessToken, RefreshToken, TokenPair};

/// Errors that can occur while persisting tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenStoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Storage for the session's two tokens.
///
/// Reads come from memory and never fail: a store that could not be loaded
/// behaves as empty. Writes may touch disk and are awaited. `clear` removes
/// both tokens together.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the current access token.
    fn access_token(&self) -> Option<AccessToken>;

    /// Returns the current refresh token.
    fn refresh_token(&self) -> Option<RefreshToken>;

    /// Replaces both tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the tokens cannot be persisted.
    async fn set_tokens(&self, tokens: TokenPair) -> Result<(), TokenStoreError>;

    /// Replaces the access token, keeping the refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted.
    async fn set_access_token(&self, token: AccessToken) -> Result<(), TokenStoreError>;

    /// Removes both tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted tokens cannot be removed.
    async fn clear(&self) -> Result<(), TokenStoreError>;
}
