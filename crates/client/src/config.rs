//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PALMETTO_API_BASE_URL` - Base URL for the storefront API
//! - `PALMETTO_TOKEN_URL` - OAuth token endpoint for the refresh exchange
//! - `PALMETTO_CLIENT_ID` - OAuth client ID
//! - `PALMETTO_CLIENT_SECRET` - OAuth client secret

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API client configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL all API request paths are joined onto.
    pub api_base_url: Url,
    /// OAuth token endpoint for the refresh exchange.
    pub token_url: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: SecretString,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("PALMETTO_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PALMETTO_API_BASE_URL".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_base_url,
            token_url: get_required_env("PALMETTO_TOKEN_URL")?,
            client_id: get_required_env("PALMETTO_CLIENT_ID")?,
            client_secret: SecretString::from(get_required_env("PALMETTO_CLIENT_SECRET")?),
        })
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}
