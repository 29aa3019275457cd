//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPCART_API_URL` - Base URL of the commerce API (e.g. `https://api.example.com/api`)
//!
//! ## Optional
//! - `SHOPCART_CREDENTIAL_FILE` - Path for the persisted bearer credential
//!   (default: `$HOME/.config/shopcart/credential`)
//! - `SHOPCART_TIMEOUT_SECS` - Request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the commerce API.
    pub base_url: Url,
    /// Path for the persisted bearer credential.
    pub credential_path: PathBuf,
    /// Request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build configuration from a variable lookup function.
    ///
    /// Separated from [`Self::from_env`] so tests can inject variables
    /// without mutating the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = var("SHOPCART_API_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("SHOPCART_API_URL".to_string()))?;
        let base_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPCART_API_URL".to_string(), e.to_string()))?;

        let credential_path = var("SHOPCART_CREDENTIAL_FILE").map_or_else(
            || default_credential_path(&var),
            PathBuf::from,
        );

        let timeout_secs = match var("SHOPCART_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPCART_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            credential_path,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn default_credential_path(var: &impl Fn(&str) -> Option<String>) -> PathBuf {
    let home = var("HOME").unwrap_or_else(|| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("shopcart")
        .join("credential")
}
