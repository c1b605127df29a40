//! Layered configuration loading.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. `pms.toml` in the working directory, or the file given with `--config`
//! 3. `PMS_*` environment variables (`PMS_BASE_URL`, `PMS_TIMEOUT_SECS`, ...)

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use pms_domain::ClientSettings;

use crate::persistence::FileTokenStore;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "pms.toml";

/// Prefix of the environment variables that override settings.
pub const ENV_PREFIX: &str = "PMS";

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or did not match the settings shape.
    #[error("could not load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The resulting base URL is unusable.
    #[error("invalid base_url: {0}")]
    InvalidBaseUrl(String),
}

/// Loads client settings from the file at `path` (or `pms.toml`, if present)
/// and the process environment.
///
/// # Errors
///
/// Returns an error if an explicit file is missing, a source is malformed,
/// or the base URL is invalid.
pub fn load_settings(path: Option<&Path>) -> Result<ClientSettings, ConfigError> {
    load_with_env(path, Environment::with_prefix(ENV_PREFIX))
}

fn load_with_env(path: Option<&Path>, env: Environment) -> Result<ClientSettings, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::new(CONFIG_FILE, FileFormat::Toml).required(false),
    };

    let mut settings: ClientSettings = Config::builder()
        .add_source(file)
        .add_source(env.try_parsing(true))
        .build()?
        .try_deserialize()?;

    if settings.token_file.is_none() {
        settings.token_file = FileTokenStore::default_path();
    }
    settings
        .base_url()
        .map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
    Ok(settings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("pms.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_file_values_are_used() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "base_url = \"https://pms.example.com/api/\"\ntimeout_secs = 10\ntoken_file = \"/tmp/pms-session.json\"\n",
        );

        let settings = load_with_env(Some(&path), env(&[])).unwrap();

        assert_eq!(settings.base_url, "https://pms.example.com/api/");
        assert_eq!(settings.timeout_secs, 10);
        assert_eq!(settings.token_file, Some(PathBuf::from("/tmp/pms-session.json")));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "timeout_secs = 10\n");

        let settings = load_with_env(
            Some(&path),
            env(&[("PMS_TIMEOUT_SECS", "3"), ("PMS_BASE_URL", "http://10.0.0.5:8000/api/")]),
        )
        .unwrap();

        assert_eq!(settings.timeout_secs, 3);
        assert_eq!(settings.base_url, "http://10.0.0.5:8000/api/");
    }

    #[test]
    fn test_missing_values_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "");

        let settings = load_with_env(Some(&path), env(&[])).unwrap();

        assert_eq!(settings.base_url, "http://localhost:8000/api/");
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.token_file, FileTokenStore::default_path());
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");

        assert!(matches!(
            load_with_env(Some(&missing), env(&[])),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "base_url = \"mailto:ops@example.com\"\n");

        assert!(matches!(
            load_with_env(Some(&path), env(&[])),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }
}
