//! Typed configuration for the core services.
//!
//! All configuration is supplied externally (config file, environment) and
//! validated here, once, at startup. Invalid or missing values are fatal:
//! the services never substitute defaults for secrets.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::ExposeSecret;
pub use secrecy::SecretString;

use crate::crypto::EncryptionKey;
use crate::error::{Result, VaultError};

/// Everything the core needs to run: where records live, the key that
/// protects them, and how to reach the upstream registry.
#[derive(Debug)]
pub struct VaultConfig {
    /// Path of the SQLite database file
    pub database_path: PathBuf,

    /// Process-wide symmetric key, already validated
    pub encryption_key: EncryptionKey,

    /// Upstream registry connection settings
    pub registry: RegistryConfig,
}

/// Connection settings for the upstream registry API.
#[derive(Debug)]
pub struct RegistryConfig {
    /// Base URL, without a trailing slash; the document number is appended
    /// as the final path segment
    pub base_url: String,

    /// Bearer credential for the registry
    pub token: SecretString,

    /// Number of retries after the first attempt (default 2, so 3 attempts)
    pub retries: u32,

    /// Base delay for linear backoff; attempt `i` waits `base_delay * i`
    pub base_delay: Duration,

    /// Timeout applied to each individual attempt, not the whole sequence
    pub timeout: Duration,
}

impl RegistryConfig {
    pub const DEFAULT_RETRIES: u32 = 2;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Build a registry configuration with the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Config` if the base URL is empty or unparsable,
    /// or if the token is empty.
    pub fn new(base_url: impl Into<String>, token: SecretString) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(VaultError::Config(
                "Registry base URL is not set".to_string(),
            ));
        }
        reqwest::Url::parse(&base_url).map_err(|e| {
            VaultError::Config(format!("Invalid registry base URL: {}", e))
        })?;

        if token.expose_secret().trim().is_empty() {
            return Err(VaultError::Config(
                "Registry API token is not set".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            token,
            retries: Self::DEFAULT_RETRIES,
            base_delay: Self::DEFAULT_BASE_DELAY,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
