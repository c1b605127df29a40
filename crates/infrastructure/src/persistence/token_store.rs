//! File-based token store.
//!
//! Keeps the session tokens in a small JSON file so a session survives
//! between console invocations:
//! ```json
//! {
//!   "access_token": "eyJhbGciOi...",
//!   "refresh_token": "eyJhbGciOi..."
//! }
//! ```
//! The file is rewritten on every change and removed on logout. Reads are
//! served from memory; writes go through `tokio::fs`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use pms_application::ports::{TokenStore, TokenStoreError};
use pms_domain::{AccessToken, RefreshToken, TokenPair};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct TokenFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<AccessToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<RefreshToken>,
}

/// Token store persisted to a JSON file.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    tokens: RwLock<TokenFile>,
    /// One file write at a time.
    writes: Mutex<()>,
}

impl FileTokenStore {
    /// Opens the store at `path`, loading any tokens already saved there.
    ///
    /// An unreadable or malformed file is treated as an empty session.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tokens = match fs::read(&path).await {
            Ok(bytes) => from_json_bytes(&bytes).unwrap_or_else(|error| {
                warn!(path = %path.display(), %error, "ignoring malformed token file");
                TokenFile::default()
            }),
            Err(error) if error.kind() == ErrorKind::NotFound => TokenFile::default(),
            Err(error) => {
                warn!(path = %path.display(), %error, "could not read token file");
                TokenFile::default()
            }
        };
        Self {
            path,
            tokens: RwLock::new(tokens),
            writes: Mutex::new(()),
        }
    }

    /// Default location: `<config dir>/pms/session.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pms").join("session.json"))
    }

    /// Returns the file backing this store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, tokens: &TokenFile) -> Result<(), TokenStoreError> {
        let bytes = to_json_stable_bytes(tokens)
            .map_err(|e| TokenStoreError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, bytes).await.map_err(io_error)?;
        restrict_permissions(&staging).await?;
        fs::rename(&staging, &self.path).await.map_err(io_error)?;
        debug!(path = %self.path.display(), "token file written");
        Ok(())
    }

    async fn update(
        &self,
        change: impl FnOnce(&mut TokenFile) + Send,
    ) -> Result<(), TokenStoreError> {
        let _writes = self.writes.lock().await;
        let mut next = self.tokens.read().clone();
        change(&mut next);
        self.write(&next).await?;
        *self.tokens.write() = next;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    fn access_token(&self) -> Option<AccessToken> {
        self.tokens.read().access_token.clone()
    }

    fn refresh_token(&self) -> Option<RefreshToken> {
        self.tokens.read().refresh_token.clone()
    }

    async fn set_tokens(&self, tokens: TokenPair) -> Result<(), TokenStoreError> {
        self.update(|file| {
            file.access_token = Some(tokens.access);
            file.refresh_token = Some(tokens.refresh);
        })
        .await
    }

    async fn set_access_token(&self, token: AccessToken) -> Result<(), TokenStoreError> {
        self.update(|file| file.access_token = Some(token)).await
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        let _writes = self.writes.lock().await;
        *self.tokens.write() = TokenFile::default();
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "token file removed");
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(error)),
        }
    }
}

fn io_error(error: std::io::Error) -> TokenStoreError {
    TokenStoreError::Io(error.to_string())
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), TokenStoreError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .map_err(io_error)
}

#[cfg(not(unix))]
#[allow(clippy::unused_async)]
async fn restrict_permissions(_path: &Path) -> Result<(), TokenStoreError> {
    Ok(())
}
