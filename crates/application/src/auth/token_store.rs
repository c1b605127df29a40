//! In-memory token storage.

use async_trait::async_trait;
use parking_lot::RwLock;
use pms_domain::{AccessToken, RefreshToken, TokenPair};

use crate::ports::{TokenStore, TokenStoreError};

#[derive(Debug, Default)]
struct Slots {
    access: Option<AccessToken>,
    refresh: Option<RefreshToken>,
}

/// Thread-safe token store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slots: RwLock<Slots>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `tokens`.
    #[must_use]
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            slots: RwLock::new(Slots {
                access: Some(tokens.access),
                refresh: Some(tokens.refresh),
            }),
        }
    }

    /// Returns true if neither token is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let slots = self.slots.read();
        slots.access.is_none() && slots.refresh.is_none()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<AccessToken> {
        self.slots.read().access.clone()
    }

    fn refresh_token(&self) -> Option<RefreshToken> {
        self.slots.read().refresh.clone()
    }

    async fn set_tokens(&self, tokens: TokenPair) -> Result<(), TokenStoreError> {
        let mut slots = self.slots.write();
        slots.access = Some(tokens.access);
        slots.refresh = Some(tokens.refresh);
        Ok(())
    }

    async fn set_access_token(&self, token: AccessToken) -> Result<(), TokenStoreError> {
        self.slots.write().access = Some(token);
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        *self.slots.write() = Slots::default();
        Ok(())
    }
}
