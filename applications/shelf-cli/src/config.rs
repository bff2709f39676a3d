/// CLI configuration
use crate::retry::RetrySettings;
use anyhow::{Context, Result};
use serde::Deserialize;
use shelf_client::ClientConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_api")]
    pub api: ClientConfig,

    /// Where the session survives between invocations
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    #[serde(default)]
    pub retry: RetrySettings,
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// `path` defaults to `shelf.toml` in the working directory; a missing
    /// default file is fine, a missing explicit one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        settings = match path {
            Some(path) => settings.add_source(config::File::from(path.to_path_buf())),
            None => settings.add_source(config::File::from(PathBuf::from("shelf.toml")).required(false)),
        };

        // Override with environment variables, e.g. SHELF__API__URL
        settings = settings.add_source(
            config::Environment::with_prefix("SHELF")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.api.api_root()?;

        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        Ok(())
    }
}

fn default_api() -> ClientConfig {
    ClientConfig::new("http://localhost:5000")
}

fn default_session_file() -> PathBuf {
    PathBuf::from(".shelf/session.json")
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api: default_api(),
            session_file: default_session_file(),
            retry: RetrySettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.toml");
        fs::write(
            &path,
            r#"
session_file = "/tmp/shelf-session.json"

[api]
url = "https://library.example.com"
default_timeout_ms = 5000

[api.capabilities]
pool_reset = true

[retry]
max_attempts = 5
"#,
        )
        .unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.api.url, "https://library.example.com");
        assert_eq!(config.api.default_timeout_ms, 5000);
        assert_eq!(config.api.base_path, "/api");
        assert!(config.api.capabilities.pool_reset);
        assert_eq!(config.session_file, PathBuf::from("/tmp/shelf-session.json"));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay_ms, RetrySettings::default().initial_delay_ms);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.toml");
        fs::write(&path, "[api]\nurl = \"library.example.com\"\n").unwrap();

        assert!(CliConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_defaults_validate() {
        let config = CliConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.api_root().unwrap(), "http://localhost:5000/api");
    }
}
