//! CLI configuration file handling.
//!
//! Configuration lives in a TOML file; secrets (the encryption key and the
//! registry token) may instead come from the environment, which always
//! wins over the file. Resolution is fail-fast: a missing key or token is
//! an error at startup, never silently defaulted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use dnivault_core::config::SecretString;
use dnivault_core::crypto::EncryptionKey;
use dnivault_core::{RegistryConfig, VaultConfig};

/// Environment variable overriding `[crypto].key_hex`.
pub const KEY_ENV: &str = "DNIVAULT_ENCRYPTION_KEY";

/// Environment variable overriding `[registry].token`.
pub const TOKEN_ENV: &str = "DNIVAULT_REGISTRY_TOKEN";

#[derive(Debug, Serialize, Deserialize)]
pub struct CliConfig {
    pub vault: VaultSection,

    #[serde(default)]
    pub crypto: CryptoSection,

    pub registry: RegistrySection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VaultSection {
    pub database_path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CryptoSection {
    /// 64 hex characters; overridden by DNIVAULT_ENCRYPTION_KEY
    pub key_hex: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrySection {
    pub base_url: String,

    /// Bearer token; overridden by DNIVAULT_REGISTRY_TOKEN
    pub token: Option<String>,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_retries() -> u32 {
    RegistryConfig::DEFAULT_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    RegistryConfig::DEFAULT_BASE_DELAY.as_millis() as u64
}

fn default_timeout_seconds() -> u64 {
    RegistryConfig::DEFAULT_TIMEOUT.as_secs()
}

impl CliConfig {
    /// A starter configuration pointing at the public registry endpoint.
    pub fn starter(database_path: PathBuf, key_hex: Option<String>) -> Self {
        Self {
            vault: VaultSection { database_path },
            crypto: CryptoSection { key_hex },
            registry: RegistrySection {
                base_url: "https://apiperu.dev/api/dni".to_string(),
                token: None,
                retries: default_retries(),
                retry_delay_ms: default_retry_delay_ms(),
                timeout_seconds: default_timeout_seconds(),
            },
        }
    }

    /// Resolve the encryption key: environment first, then the file.
    pub fn encryption_key(&self) -> anyhow::Result<EncryptionKey> {
        let encoded = match std::env::var(KEY_ENV) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => self.crypto.key_hex.clone().unwrap_or_default(),
        };

        EncryptionKey::from_hex(&encoded).with_context(|| {
            format!(
                "no usable encryption key; set {} or [crypto].key_hex in the config",
                KEY_ENV
            )
        })
    }

    /// Resolve the registry connection settings, token from environment
    /// first.
    pub fn registry_config(&self) -> anyhow::Result<RegistryConfig> {
        let token = match std::env::var(TOKEN_ENV) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => self.registry.token.clone().unwrap_or_default(),
        };

        let config = RegistryConfig::new(self.registry.base_url.as_str(), SecretString::from(token))
            .with_context(|| {
                format!(
                    "registry configuration is incomplete; set {} or [registry].token",
                    TOKEN_ENV
                )
            })?
            .with_retries(self.registry.retries)
            .with_base_delay(Duration::from_millis(self.registry.retry_delay_ms))
            .with_timeout(Duration::from_secs(self.registry.timeout_seconds));

        Ok(config)
    }

    /// Resolve the full core configuration in one fail-fast step.
    pub fn vault_config(&self) -> anyhow::Result<VaultConfig> {
        Ok(VaultConfig {
            database_path: self.vault.database_path.clone(),
            encryption_key: self.encryption_key()?,
            registry: self.registry_config()?,
        })
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_database_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("records.db"))
}

pub fn read_config(path: &Path) -> anyhow::Result<CliConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse config {}", path.display()))
}

pub fn write_config(path: &Path, config: &CliConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("TOML serialization failed")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config {}", path.display()))?;
    Ok(())
}

fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("dnivault"));
        }
    }
    Ok(home_dir()?.join(".config").join("dnivault"))
}

fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("dnivault"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("dnivault"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
