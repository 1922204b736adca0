//! Production credential loading for the platform API
//!
//! ## Configuration Sources
//! Credentials are loaded from:
//! 1. `.env` file in the current directory or parent directories (if present)
//! 2. System environment variables
//!
//! Environment variables take precedence over `.env` file values.
//!
//! ## Required Keys
//! - `PLATFORM_API_URL`: Base URL of the platform API
//! - `PLATFORM_API_KEY`: API key authorizing this runner

use crate::traits::{CredentialSource, Credentials, MissingCredential};

/// Real credential source using environment variables
pub struct EnvCredentialSource;

impl EnvCredentialSource {
    const URL_KEY: &'static str = "PLATFORM_API_URL";
    const API_KEY: &'static str = "PLATFORM_API_KEY";

    /// Initialize environment by loading a `.env` file if present.
    ///
    /// Safe to call multiple times; dotenv never overrides variables that
    /// are already set.
    fn init_env() {
        let _ = dotenv::dotenv();
    }
}

#[async_trait::async_trait]
impl CredentialSource for EnvCredentialSource {
    async fn get_credentials(&self) -> Result<Credentials, MissingCredential> {
        Self::init_env();

        let mut missing = Vec::new();
        let api_url = std::env::var(Self::URL_KEY).ok();
        let api_key = std::env::var(Self::API_KEY).ok();

        if api_url.is_none() {
            missing.push(Self::URL_KEY);
        }
        if api_key.is_none() {
            missing.push(Self::API_KEY);
        }

        match (api_url, api_key) {
            (Some(api_url), Some(api_key)) => Ok(Credentials { api_url, api_key }),
            _ => Err(MissingCredential {
                key_name: missing.join(", "),
                message: format!(
                    "Missing required platform credentials: {}. These must be set as environment variables or in a .env file.",
                    missing.join(", ")
                ),
            }),
        }
    }
}
