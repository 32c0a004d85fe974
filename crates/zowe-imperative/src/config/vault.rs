//! Secure credential vault adapters
//!
//! Secure config properties and certificate material never land in the
//! plaintext config files. They are kept in a vault keyed by a string.

use crate::error::{ImperativeError, ImperativeResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::debug;

/// Credential vault interface
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialVault: Send + Sync {
    /// Load the value stored under a key
    async fn load(&self, key: &str) -> ImperativeResult<Option<String>>;

    /// Store a value under a key
    async fn save(&self, key: &str, value: &str) -> ImperativeResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> ImperativeResult<()>;

    /// Load PEM certificate bytes for an account
    async fn load_certificate(&self, account: &str) -> ImperativeResult<Option<Vec<u8>>> {
        Ok(self
            .load(&format!("{}/cert", account))
            .await?
            .map(String::into_bytes))
    }

    /// Load PEM certificate key bytes for an account
    async fn load_certificate_key(&self, account: &str) -> ImperativeResult<Option<Vec<u8>>> {
        Ok(self
            .load(&format!("{}/certKey", account))
            .await?
            .map(String::into_bytes))
    }
}

/// In-memory vault for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryVault {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryVault {
    /// Create an empty vault
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.lock().insert(key.into(), value.into());
        self
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the vault is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl CredentialVault for MemoryVault {
    async fn load(&self, key: &str) -> ImperativeResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> ImperativeResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> ImperativeResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Vault backed by the operating system keyring
#[cfg(feature = "keyring")]
#[derive(Debug, Clone)]
pub struct KeyringVault {
    service: String,
}

#[cfg(feature = "keyring")]
impl KeyringVault {
    /// Create a vault using the given service name (the app name)
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(service: &str, key: &str) -> ImperativeResult<keyring::Entry> {
        keyring::Entry::new(service, key)
            .map_err(|e| ImperativeError::credential(format!("Cannot open vault entry '{}': {}", key, e)))
    }
}

#[cfg(feature = "keyring")]
#[async_trait]
impl CredentialVault for KeyringVault {
    async fn load(&self, key: &str) -> ImperativeResult<Option<String>> {
        let (service, key) = (self.service.clone(), key.to_string());
        tokio::task::spawn_blocking(move || {
            let entry = Self::entry(&service, &key)?;
            match entry.get_password() {
                Ok(value) => Ok(Some(value)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(ImperativeError::credential(format!(
                    "Failed to load '{}' from the vault: {}",
                    key, e
                ))),
            }
        })
        .await?
    }

    async fn save(&self, key: &str, value: &str) -> ImperativeResult<()> {
        let (service, key, value) = (self.service.clone(), key.to_string(), value.to_string());
        tokio::task::spawn_blocking(move || {
            Self::entry(&service, &key)?.set_password(&value).map_err(|e| {
                ImperativeError::credential(format!("Failed to save '{}' to the vault: {}", key, e))
            })
        })
        .await?
    }

    async fn delete(&self, key: &str) -> ImperativeResult<()> {
        let (service, key) = (self.service.clone(), key.to_string());
        tokio::task::spawn_blocking(move || match Self::entry(&service, &key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ImperativeError::credential(format!(
                "Failed to delete '{}' from the vault: {}",
                key, e
            ))),
        })
        .await?
    }
}

/// Load a JSON document stored in the vault, `None` when absent
pub async fn load_json(
    vault: &dyn CredentialVault,
    key: &str,
) -> ImperativeResult<Option<serde_json::Value>> {
    match vault.load(key).await? {
        Some(text) if !text.trim().is_empty() => {
            let value = serde_json::from_str(&text).map_err(|e| {
                ImperativeError::credential(format!("Vault entry '{}' is not valid JSON: {}", key, e))
            })?;
            Ok(Some(value))
        }
        _ => {
            debug!("Vault entry '{}' is empty", key);
            Ok(None)
        }
    }
}
