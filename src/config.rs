//! Connection settings loaded from the environment (optionally via `.env`).

use std::env;

use redmine_api::RedmineConfig;
use thiserror::Error;

pub const URL_VAR: &str = "REDMINE_URL";
pub const API_KEY_VAR: &str = "REDMINE_API_KEY";
const MIN_API_KEY_LEN: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set; add it to .env or the environment")]
    Missing(&'static str),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("invalid REDMINE_URL '{0}': the URL must start with http:// or https://")]
    InvalidUrl(String),
    #[error("REDMINE_API_KEY looks too short ({0} characters); check the key")]
    KeyTooShort(usize),
}

/// Represents the validated endpoint and API key pair used to reach Redmine.
#[derive(Clone)]
pub struct Credentials {
    url: String,
    api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Validates a raw pair. Both values are trimmed first.
    pub fn new(url: &str, api_key: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        let api_key = api_key.trim();

        if url.is_empty() {
            return Err(ConfigError::Empty(URL_VAR));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(url.to_string()));
        }
        if api_key.is_empty() {
            return Err(ConfigError::Empty(API_KEY_VAR));
        }
        let key_len = api_key.chars().count();
        if key_len < MIN_API_KEY_LEN {
            return Err(ConfigError::KeyTooShort(key_len));
        }

        Ok(Self {
            url: url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Loads `.env` from the working directory when present, then reads
    /// both variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                log::warn!("Ignoring unreadable .env file: {}", err);
            }
        }
        let url = env::var(URL_VAR).map_err(|_| ConfigError::Missing(URL_VAR))?;
        let api_key = env::var(API_KEY_VAR).map_err(|_| ConfigError::Missing(API_KEY_VAR))?;
        Self::new(&url, &api_key)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn client_config(&self) -> RedmineConfig {
        RedmineConfig::new(self.url.clone(), self.api_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Credentials, API_KEY_VAR, URL_VAR};

    const KEY: &str = "abcdef0123456789";

    #[test]
    fn accepts_http_and_https_and_trims() {
        let creds = Credentials::new("  https://redmine.example.com/ ", &format!(" {KEY} "))
            .expect("valid pair");
        assert_eq!(creds.url(), "https://redmine.example.com/");
        assert_eq!(creds.client_config().api_key, KEY);

        assert!(Credentials::new("http://localhost:3000", KEY).is_ok());
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(
            Credentials::new("ftp://redmine", KEY).unwrap_err(),
            ConfigError::InvalidUrl("ftp://redmine".to_string())
        );
    }

    #[test]
    fn rejects_empty_values() {
        assert_eq!(
            Credentials::new("   ", KEY).unwrap_err(),
            ConfigError::Empty(URL_VAR)
        );
        assert_eq!(
            Credentials::new("https://redmine", "  ").unwrap_err(),
            ConfigError::Empty(API_KEY_VAR)
        );
    }

    #[test]
    fn rejects_short_keys() {
        assert_eq!(
            Credentials::new("https://redmine", "short").unwrap_err(),
            ConfigError::KeyTooShort(5)
        );
    }

    #[test]
    fn debug_output_hides_the_key() {
        let creds = Credentials::new("https://redmine", KEY).expect("valid pair");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains(KEY));
        assert!(rendered.contains("<redacted>"));
    }
}
