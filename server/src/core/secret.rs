//! Signing-key storage
//!
//! The JWT signing key is read from `CANVASS_JWT_SECRET` when set. Otherwise
//! a random key is generated once and persisted in a JSON vault inside the
//! data directory, so tokens survive restarts.
//!
//! | Backend | Source |
//! |---------|--------|
//! | Env | `CANVASS_JWT_SECRET` (raw bytes, at least 32) |
//! | File | `<data>/secrets.json` |

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::constants::{ENV_JWT_SECRET, SECRET_KEY_JWT_SIGNING, SECRETS_FILENAME};
use super::storage::AppStorage;
use crate::utils::crypto;

/// Minimum signing key length in bytes
const MIN_KEY_LEN: usize = 32;

/// Where the signing key comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretBackend {
    /// Key supplied through the environment; never written to disk
    Env,
    /// JSON vault file
    File(PathBuf),
}

impl SecretBackend {
    /// Get a human-readable name for the backend
    pub fn name(&self) -> &'static str {
        match self {
            Self::Env => "environment",
            Self::File(_) => "file",
        }
    }
}

/// Metadata associated with a stored secret
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SecretMetadata {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }
}

/// A secret with its value and metadata
#[derive(Clone, Serialize, Deserialize)]
pub struct Secret {
    pub value: String,
    pub metadata: SecretMetadata,
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("value", &"[REDACTED]")
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            metadata: SecretMetadata::new(),
        }
    }
}

/// Secret vault - stores all secrets in a single structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SecretVault {
    secrets: HashMap<String, Secret>,
}

/// Signing-key manager
///
/// The vault is cached in memory after the initial load. Changes update
/// both memory and the file.
#[derive(Clone)]
pub struct SecretManager {
    backend: SecretBackend,
    env_key: Option<Vec<u8>>,
    vault: Arc<RwLock<SecretVault>>,
    /// Serializes file writes
    save_mutex: Arc<tokio::sync::Mutex<()>>,
}

impl SecretManager {
    /// Initialize from the environment, falling back to the data-dir vault
    pub async fn init(storage: &AppStorage) -> Result<Self> {
        let env_value = std::env::var(ENV_JWT_SECRET).ok().filter(|v| !v.is_empty());
        let manager = Self::from_parts(env_value, storage.data_path(SECRETS_FILENAME)).await?;
        tracing::debug!(backend = manager.backend.name(), "Secret manager initialized");
        Ok(manager)
    }

    async fn from_parts(env_value: Option<String>, vault_path: PathBuf) -> Result<Self> {
        if let Some(value) = env_value {
            let key = value.into_bytes();
            if key.len() < MIN_KEY_LEN {
                anyhow::bail!(
                    "{} must be at least {} bytes long",
                    ENV_JWT_SECRET,
                    MIN_KEY_LEN
                );
            }
            return Ok(Self {
                backend: SecretBackend::Env,
                env_key: Some(key),
                vault: Arc::default(),
                save_mutex: Arc::default(),
            });
        }

        let vault = load_vault_from_file(&vault_path).await?;
        Ok(Self {
            backend: SecretBackend::File(vault_path),
            env_key: None,
            vault: Arc::new(RwLock::new(vault)),
            save_mutex: Arc::default(),
        })
    }

    /// Get the active backend type
    pub fn backend(&self) -> &SecretBackend {
        &self.backend
    }

    /// Store a secret in the vault
    async fn set(&self, name: &str, mut secret: Secret) -> Result<()> {
        let SecretBackend::File(path) = &self.backend else {
            return Err(anyhow!("Secrets cannot be stored in the environment"));
        };
        {
            let mut vault = self.vault.write().await;
            if let Some(existing) = vault.secrets.get(name) {
                secret.metadata.created_at = existing.metadata.created_at;
            }
            secret.metadata.updated_at = Utc::now();
            vault.secrets.insert(name.to_string(), secret);
        }
        self.save_vault_to_file(path).await?;
        tracing::debug!(name, "Stored secret");
        Ok(())
    }

    async fn get_value(&self, name: &str) -> Option<String> {
        let vault = self.vault.read().await;
        vault.secrets.get(name).map(|s| s.value.clone())
    }

    /// Get the JWT signing key, creating and persisting it if needed
    pub async fn get_jwt_signing_key(&self) -> Result<Vec<u8>> {
        if let Some(key) = &self.env_key {
            return Ok(key.clone());
        }

        match self.get_value(SECRET_KEY_JWT_SIGNING).await {
            Some(key_hex) => {
                if let Ok(key) = crypto::decode_hex(&key_hex)
                    && key.len() >= MIN_KEY_LEN
                {
                    return Ok(key);
                }
                tracing::warn!("Stored JWT signing key has invalid format, regenerating");
                self.create_jwt_signing_key().await
            }
            None => self.create_jwt_signing_key().await,
        }
    }

    async fn create_jwt_signing_key(&self) -> Result<Vec<u8>> {
        let key = crypto::generate_signing_key();
        self.set(SECRET_KEY_JWT_SIGNING, Secret::new(crypto::encode_hex(&key)))
            .await?;
        tracing::debug!("Created new JWT signing key");
        Ok(key)
    }

    async fn save_vault_to_file(&self, path: &Path) -> Result<()> {
        let _guard = self.save_mutex.lock().await;
        let vault = self.vault.read().await;
        let json = serde_json::to_string_pretty(&*vault).context("Failed to serialize vault")?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create secrets directory")?;
        }

        tokio::fs::write(path, json)
            .await
            .context("Failed to write secrets file")?;
        Ok(())
    }
}

async fn load_vault_from_file(path: &Path) -> Result<SecretVault> {
    match tokio::fs::read_to_string(path).await {
        Ok(json) => {
            let vault: SecretVault =
                serde_json::from_str(&json).context("Failed to parse secrets file")?;
            tracing::debug!(count = vault.secrets.len(), "Loaded secrets from file");
            Ok(vault)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No existing secrets file, creating new vault");
            Ok(SecretVault::default())
        }
        Err(e) => Err(anyhow!("Failed to load secrets file: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_redacts_value() {
        let secret = Secret::new("super-secret-value");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_env_key_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let value = "k".repeat(40);
        let manager = SecretManager::from_parts(Some(value.clone()), dir.path().join("s.json"))
            .await
            .unwrap();

        assert_eq!(manager.backend(), &SecretBackend::Env);
        assert_eq!(manager.get_jwt_signing_key().await.unwrap(), value.into_bytes());
        assert!(!dir.path().join("s.json").exists());
    }

    #[tokio::test]
    async fn test_short_env_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            SecretManager::from_parts(Some("short".to_string()), dir.path().join("s.json")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_file_key_is_generated_once_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");

        let first = SecretManager::from_parts(None, path.clone()).await.unwrap();
        let key = first.get_jwt_signing_key().await.unwrap();
        assert_eq!(key.len(), 32);
        assert_eq!(first.get_jwt_signing_key().await.unwrap(), key);
        assert!(path.exists());

        let reloaded = SecretManager::from_parts(None, path).await.unwrap();
        assert_eq!(reloaded.get_jwt_signing_key().await.unwrap(), key);
    }

    #[tokio::test]
    async fn test_corrupt_stored_key_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let vault = serde_json::json!({
            "secrets": {
                SECRET_KEY_JWT_SIGNING: {
                    "value": "not-hex",
                    "metadata": { "created_at": Utc::now(), "updated_at": Utc::now() }
                }
            }
        });
        std::fs::write(&path, vault.to_string()).unwrap();

        let manager = SecretManager::from_parts(None, path).await.unwrap();
        assert_eq!(manager.get_jwt_signing_key().await.unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_unparseable_vault_fails_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(SecretManager::from_parts(None, path).await.is_err());
    }
}
