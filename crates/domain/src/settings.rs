//! Client settings
//!
//! Connection preferences for the API client. Loading and layering happen in
//! the infrastructure crate; this is the plain data shape.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Settings shared by every component that talks to the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// API root, e.g. `http://localhost:8000/api/`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Transport timeout per request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Where the session tokens are persisted. `None` keeps them in memory.
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    /// User-Agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("pms-console/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token_file: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientSettings {
    /// Parses the base URL, forcing a trailing slash so relative paths join
    /// beneath it instead of replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or cannot be a base.
    pub fn base_url(&self) -> DomainResult<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| DomainError::InvalidUrl(format!("{e}: {raw}")))?;
        if url.cannot_be_a_base() {
            return Err(DomainError::InvalidUrl(raw));
        }
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn base_url_gets_trailing_slash() {
        let settings = ClientSettings {
            base_url: "https://pms.example.com/api".to_string(),
            ..ClientSettings::default()
        };
        let base = settings.base_url().unwrap();
        assert_eq!(
            base.join("properties/").unwrap().as_str(),
            "https://pms.example.com/api/properties/"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        let settings = ClientSettings {
            base_url: "mailto:ops@example.com".to_string(),
            ..ClientSettings::default()
        };
        assert!(settings.base_url().is_err());
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let settings: ClientSettings = serde_json::from_str(r#"{"timeout_secs":5}"#).unwrap();
        assert_eq!(settings.timeout_secs, 5);
        assert_eq!(settings.base_url, "http://localhost:8000/api/");
        assert!(settings.user_agent.starts_with("pms-console/"));
    }
}
