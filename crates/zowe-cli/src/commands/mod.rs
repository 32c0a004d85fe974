//! CLI commands

pub mod config;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;
use zowe_imperative::config::CredentialVault;
use zowe_imperative::error::{ImperativeResult, ResultExt};
use zowe_imperative::settings::ImperativeSettings;

/// Directory the project config search starts from
pub fn working_dir() -> ImperativeResult<PathBuf> {
    std::env::current_dir().context("Unable to determine the working directory")
}

/// Vault holding secure team config values
pub fn open_vault(settings: &ImperativeSettings) -> Arc<dyn CredentialVault> {
    #[cfg(feature = "keyring")]
    {
        Arc::new(zowe_imperative::config::KeyringVault::new(settings.app_name.clone()))
    }
    #[cfg(not(feature = "keyring"))]
    {
        tracing::debug!(
            "Built without keyring support; secure values for {} live in memory only",
            settings.app_name
        );
        Arc::new(zowe_imperative::config::MemoryVault::new())
    }
}
