//! Environment variable-based settings for the imperative core
//!
//! Supports environment variables with the ZOWE_ prefix. Everything read here
//! can also be overridden with the `with_*` builders.

use crate::error::{ImperativeError, ImperativeResult};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default application name, used for config file names and the vault service
pub const DEFAULT_APP_NAME: &str = "zowe";

/// Default prompt timeout in seconds
pub const DEFAULT_PROMPT_TIMEOUT_SECS: u64 = 600;

/// Largest accepted prompt timeout in seconds
pub const MAX_PROMPT_TIMEOUT_SECS: u64 = 3600;

/// Prefix of environment variables that supply command options
pub const DEFAULT_ENV_PREFIX: &str = "ZOWE_OPT_";

const CLI_HOME_VAR: &str = "ZOWE_CLI_HOME";
const PROMPT_TIMEOUT_VAR: &str = "ZOWE_PROMPT_TIMEOUT";

/// Process-level settings of the imperative core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImperativeSettings {
    /// Application name (`zowe`)
    pub app_name: String,
    /// Home directory holding the global config layers and legacy profiles
    pub cli_home: PathBuf,
    /// Seconds to wait for a prompt answer; 0 waits forever
    pub prompt_timeout_secs: u64,
    /// Prefix for option environment variables
    pub env_prefix: String,
}

impl Default for ImperativeSettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            cli_home: default_cli_home(DEFAULT_APP_NAME),
            prompt_timeout_secs: DEFAULT_PROMPT_TIMEOUT_SECS,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }
}

impl ImperativeSettings {
    /// Load settings from the process environment
    pub fn from_env() -> ImperativeResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> ImperativeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(home) = lookup(CLI_HOME_VAR).filter(|v| !v.trim().is_empty()) {
            settings.cli_home = PathBuf::from(shellexpand::tilde(home.trim()).into_owned());
        }

        if let Some(raw) = lookup(PROMPT_TIMEOUT_VAR).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ImperativeError::config(format!("Invalid {} value: '{}'", PROMPT_TIMEOUT_VAR, raw))
            })?;
            settings.prompt_timeout_secs = secs.min(MAX_PROMPT_TIMEOUT_SECS);
        }

        Ok(settings)
    }

    /// Set the application name
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Set the CLI home directory
    pub fn with_cli_home(mut self, cli_home: impl Into<PathBuf>) -> Self {
        self.cli_home = cli_home.into();
        self
    }

    /// Set the prompt timeout in seconds (capped)
    pub fn with_prompt_timeout_secs(mut self, secs: u64) -> Self {
        self.prompt_timeout_secs = secs.min(MAX_PROMPT_TIMEOUT_SECS);
        self
    }

    /// Prompt timeout, `None` when prompts wait forever
    pub fn prompt_timeout(&self) -> Option<Duration> {
        match self.prompt_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// `<app>.config.json`
    pub fn config_file_name(&self) -> String {
        format!("{}.config.json", self.app_name)
    }

    /// `<app>.config.user.json`
    pub fn user_config_file_name(&self) -> String {
        format!("{}.config.user.json", self.app_name)
    }

    /// Directory of legacy (V1) profiles
    pub fn legacy_profiles_dir(&self) -> PathBuf {
        self.cli_home.join("profiles")
    }

    /// Environment variable carrying an option, e.g. `token-type` -> `ZOWE_OPT_TOKEN_TYPE`
    pub fn env_var_for_option(&self, option: &str) -> String {
        format!(
            "{}{}",
            self.env_prefix,
            option.replace('-', "_").to_uppercase()
        )
    }
}

fn default_cli_home(app_name: &str) -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(format!(".{}", app_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = ImperativeSettings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings.app_name, "zowe");
        assert_eq!(settings.prompt_timeout_secs, 600);
        assert_eq!(settings.config_file_name(), "zowe.config.json");
        assert_eq!(settings.user_config_file_name(), "zowe.config.user.json");
        assert!(settings.cli_home.ends_with(".zowe"));
    }

    #[test]
    fn test_cli_home_from_env() {
        let settings =
            ImperativeSettings::from_lookup(lookup_from(&[("ZOWE_CLI_HOME", "/tmp/zowe-home")]))
                .unwrap();
        assert_eq!(settings.cli_home, PathBuf::from("/tmp/zowe-home"));
        assert_eq!(
            settings.legacy_profiles_dir(),
            PathBuf::from("/tmp/zowe-home/profiles")
        );
    }

    #[test]
    fn test_prompt_timeout_capped() {
        let settings =
            ImperativeSettings::from_lookup(lookup_from(&[("ZOWE_PROMPT_TIMEOUT", "99999")]))
                .unwrap();
        assert_eq!(settings.prompt_timeout_secs, MAX_PROMPT_TIMEOUT_SECS);
    }

    #[test]
    fn test_prompt_timeout_zero_waits_forever() {
        let settings =
            ImperativeSettings::from_lookup(lookup_from(&[("ZOWE_PROMPT_TIMEOUT", "0")])).unwrap();
        assert!(settings.prompt_timeout().is_none());
        assert_eq!(
            ImperativeSettings::default().prompt_timeout(),
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn test_invalid_prompt_timeout() {
        let result =
            ImperativeSettings::from_lookup(lookup_from(&[("ZOWE_PROMPT_TIMEOUT", "soon")]));
        assert!(matches!(result, Err(ImperativeError::Config { .. })));
    }

    #[test]
    fn test_env_var_for_option() {
        let settings = ImperativeSettings::default();
        assert_eq!(settings.env_var_for_option("token-type"), "ZOWE_OPT_TOKEN_TYPE");
        assert_eq!(settings.env_var_for_option("host"), "ZOWE_OPT_HOST");
    }
}
