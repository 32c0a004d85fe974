//! Process-level configuration state
//!
//! Holds what the resolver and auto-store need from the application: the
//! settings, the known profile schemas, the loaded team config, the secure
//! vault and the token-capable auth handlers.

use super::auto_store::AuthHandler;
use super::schema::LoadedConfig;
use super::store::Config;
use super::vault::CredentialVault;
use crate::error::ImperativeResult;
use crate::settings::ImperativeSettings;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Application configuration shared by every resolution in the process
pub struct ImperativeConfig {
    settings: ImperativeSettings,
    loaded: LoadedConfig,
    config: Option<RwLock<Config>>,
    vault: Option<Arc<dyn CredentialVault>>,
    auth_handlers: Vec<(String, Arc<dyn AuthHandler>)>,
}

impl ImperativeConfig {
    /// Create with settings and no team config
    pub fn new(settings: ImperativeSettings) -> Self {
        Self {
            settings,
            loaded: LoadedConfig::zowe_defaults(),
            config: None,
            vault: None,
            auth_handlers: Vec::new(),
        }
    }

    /// Load the team config from disk, with secure values from the vault
    pub async fn load(
        settings: ImperativeSettings,
        cwd: &Path,
        vault: Option<Arc<dyn CredentialVault>>,
    ) -> ImperativeResult<Self> {
        let mut config = Config::load(&settings, cwd)?;
        if let Some(vault) = &vault {
            if config.exists() {
                config.load_secure(&**vault).await?;
            }
        }
        debug!("Team config exists: {}", config.exists());

        let mut imperative = Self::new(settings).with_config(config);
        imperative.vault = vault;
        Ok(imperative)
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(RwLock::new(config));
        self
    }

    pub fn with_vault(mut self, vault: Arc<dyn CredentialVault>) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn with_loaded_config(mut self, loaded: LoadedConfig) -> Self {
        self.loaded = loaded;
        self
    }

    /// Register an auth handler for a profile type
    pub fn with_auth_handler(
        mut self,
        profile_type: impl Into<String>,
        handler: Arc<dyn AuthHandler>,
    ) -> Self {
        self.auth_handlers.push((profile_type.into(), handler));
        self
    }

    pub fn settings(&self) -> &ImperativeSettings {
        &self.settings
    }

    pub fn loaded_config(&self) -> &LoadedConfig {
        &self.loaded
    }

    /// The team config, when one was loaded
    pub fn config(&self) -> Option<&RwLock<Config>> {
        self.config.as_ref()
    }

    pub fn vault(&self) -> Option<&Arc<dyn CredentialVault>> {
        self.vault.as_ref()
    }

    /// Auth handler registered for a profile type
    pub fn auth_handler_for(&self, profile_type: &str) -> Option<&Arc<dyn AuthHandler>> {
        self.auth_handlers
            .iter()
            .find(|(t, _)| t == profile_type)
            .map(|(_, handler)| handler)
    }

    /// Whether a team config exists in any layer
    pub async fn config_exists(&self) -> bool {
        match &self.config {
            Some(config) => config.read().await.exists(),
            None => false,
        }
    }

    /// No team config exists but a legacy profiles directory does
    pub async fn only_v1_profiles_exist(&self) -> bool {
        !self.config_exists().await && self.settings.legacy_profiles_dir().is_dir()
    }
}

impl fmt::Debug for ImperativeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImperativeConfig")
            .field("settings", &self.settings)
            .field("has_config", &self.config.is_some())
            .field("has_vault", &self.vault.is_some())
            .field(
                "auth_handlers",
                &self.auth_handlers.iter().map(|(t, _)| t).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::vault::MemoryVault;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_only_v1_profiles_exist() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let settings = ImperativeSettings::default().with_cli_home(home.path());

        let imperative = ImperativeConfig::load(settings.clone(), project.path(), None)
            .await
            .unwrap();
        assert!(!imperative.config_exists().await);
        assert!(!imperative.only_v1_profiles_exist().await);

        fs::create_dir_all(home.path().join("profiles")).unwrap();
        assert!(imperative.only_v1_profiles_exist().await);

        fs::write(project.path().join("zowe.config.json"), "{}").unwrap();
        let imperative = ImperativeConfig::load(settings, project.path(), None)
            .await
            .unwrap();
        assert!(imperative.config_exists().await);
        assert!(!imperative.only_v1_profiles_exist().await);
    }

    #[tokio::test]
    async fn test_load_merges_secure_values() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let layer_path = project.path().join("zowe.config.json");
        fs::write(
            &layer_path,
            r#"{"profiles": {"base": {"type": "base", "secure": ["password"]}}}"#,
        )
        .unwrap();
        let secure = serde_json::json!({
            (layer_path.display().to_string()): {"profiles.base.properties.password": "pw1"}
        });
        let vault: Arc<dyn CredentialVault> = Arc::new(
            MemoryVault::new().with_entry(super::super::store::SECURE_CONFIG_KEY, secure.to_string()),
        );

        let settings = ImperativeSettings::default().with_cli_home(home.path());
        let imperative = ImperativeConfig::load(settings, project.path(), Some(vault))
            .await
            .unwrap();
        let config = imperative.config().unwrap().read().await;
        assert_eq!(config.get_profile("base")["password"], "pw1");
    }

    #[test]
    fn test_without_config() {
        let imperative = ImperativeConfig::new(ImperativeSettings::default());
        assert!(imperative.config().is_none());
        assert!(imperative.vault().is_none());
        assert!(imperative.auth_handler_for("zosmf").is_none());
        assert!(imperative.loaded_config().schema_for("zosmf").is_some());
    }
}
