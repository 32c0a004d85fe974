//! Automatic storage of prompted connection properties in team config
//!
//! After the resolver prompts for values, the values are written back to
//! the profile the command would have read them from, so the next command
//! does not ask again.

use super::imperative::ImperativeConfig;
use super::profile::profile_path_from_name;
use super::store::Config;
use crate::error::ImperativeResult;
use crate::prompt::HandlerContext;
use crate::session::auth_order::{PropUse, get_prop_nm_for};
use crate::session::auth_type::{AuthType, TOKEN_TYPE_APIML};
use crate::session::{CommandArguments, Session, SessionConfig};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Service able to exchange credentials for a token
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthHandler: Send + Sync {
    /// Token type this service issues
    fn default_token_type(&self) -> String;

    /// Log in and return the token value
    async fn session_login(&self, session: &Session) -> ImperativeResult<String>;
}

/// Persists properties from a session config into team config
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AutoStore: Send + Sync {
    /// Store the named session properties in the active profile.
    ///
    /// May replace user and password in `sess` with a freshly fetched token.
    async fn store_sess_cfg_props(
        &self,
        params: &HandlerContext,
        sess: &mut SessionConfig,
        prop_names: &[String],
    ) -> ImperativeResult<()>;
}

/// Auto-store backed by the process team config
#[derive(Debug, Clone)]
pub struct ConfigAutoStore {
    imperative: Arc<ImperativeConfig>,
}

impl ConfigAutoStore {
    pub fn new(imperative: Arc<ImperativeConfig>) -> Self {
        Self { imperative }
    }

    /// First profile type of the command whose schema defines every
    /// property, with the name of the active profile of that type
    pub async fn find_active_profile(
        &self,
        params: &HandlerContext,
        profile_props: &[String],
    ) -> Option<(String, String)> {
        match self.imperative.config() {
            Some(lock) => {
                let config = lock.read().await;
                self.active_profile_in(Some(&config), params, profile_props)
            }
            None => self.active_profile_in(None, params, profile_props),
        }
    }

    fn active_profile_in(
        &self,
        config: Option<&Config>,
        params: &HandlerContext,
        profile_props: &[String],
    ) -> Option<(String, String)> {
        let loaded = self.imperative.loaded_config();
        params
            .profile_types()
            .find(|profile_type| {
                loaded.profiles.iter().any(|schema| {
                    &schema.profile_type == *profile_type
                        && schema.defines_all(profile_props.iter().map(String::as_str))
                })
            })
            .map(|profile_type| {
                let name = match config {
                    Some(config) => config.active_profile_name(profile_type, Some(&params.arguments), None),
                    None => profile_type.clone(),
                };
                (profile_type.clone(), name)
            })
    }

    /// Token auth handler for a profile.
    ///
    /// Base profiles need a `tokenType`. Service profiles need a `basePath`
    /// and fall back to the base profile when they have no `tokenType`.
    pub fn find_auth_handler_for_profile(
        &self,
        config: &Config,
        profile_name: &str,
        args: &CommandArguments,
    ) -> Option<Arc<dyn AuthHandler>> {
        if !config.profile_exists(profile_name) {
            return None;
        }
        let profile_type = config.profile_type(profile_name)?;
        let profile = config.get_profile(profile_name);
        let token_type = profile.get("tokenType").and_then(Value::as_str);

        if profile_type != "base" {
            if profile.get("basePath").is_none_or(Value::is_null) {
                return None;
            }
            if token_type.is_none() {
                let base_name = config.active_profile_name("base", Some(args), None);
                if base_name == profile_name {
                    return None;
                }
                return self.find_auth_handler_for_profile(config, &base_name, args);
            }
        }
        let token_type = token_type?;

        [profile_type.as_str(), "base"]
            .into_iter()
            .filter_map(|t| self.imperative.auth_handler_for(t))
            .find(|handler| {
                token_type == handler.default_token_type() || token_type.starts_with(TOKEN_TYPE_APIML)
            })
            .cloned()
    }

    /// Log in with the session's credentials and keep the token instead
    async fn fetch_token_for_sess_cfg(
        &self,
        config: &Config,
        params: &HandlerContext,
        sess: &mut SessionConfig,
        profile_name: &str,
    ) -> ImperativeResult<bool> {
        let Some(handler) = self.find_auth_handler_for_profile(config, profile_name, &params.arguments)
        else {
            return Ok(false);
        };

        sess.auth_type = Some(AuthType::Token);
        sess.token_type = Some(
            params
                .arguments
                .get_str("tokenType")
                .unwrap_or_else(|| handler.default_token_type()),
        );

        let mut login_cfg = SessionConfig {
            auth_type: Some(AuthType::Token),
            ..Default::default()
        };
        if let Some(base) = &self.imperative.loaded_config().base_profile {
            for prop_name in base.properties.keys() {
                let sess_name = get_prop_nm_for(prop_name, PropUse::SessCfg);
                if let Some(value) = sess.get_prop(&sess_name) {
                    login_cfg.set_prop(&sess_name, value)?;
                }
            }
        }

        info!(
            "Fetching {} for {}",
            sess.token_type.as_deref().unwrap_or_default(),
            profile_path_from_name(profile_name)
        );
        let token = handler.session_login(&Session::new(login_cfg)?).await?;
        sess.token_value = Some(token);
        sess.user = None;
        sess.password = None;
        Ok(true)
    }

    async fn store_in_active_layer(
        &self,
        config: &mut Config,
        params: &HandlerContext,
        sess: &mut SessionConfig,
        profile_type: &str,
        profile_name: &str,
        mut profile_props: Vec<String>,
    ) -> ImperativeResult<()> {
        let has = |name: &str| profile_props.iter().any(|p| p == name);
        if has("user")
            && has("password")
            && self
                .fetch_token_for_sess_cfg(config, params, sess, profile_name)
                .await?
        {
            profile_props.retain(|p| p != "user" && p != "password");
            profile_props.push("tokenValue".to_string());
        }

        if let Some((user, global)) = config.find_layer(profile_name) {
            config.activate(user, global);
        }

        let loaded = self.imperative.loaded_config();
        let profile_path = profile_path_from_name(profile_name);
        let profile_obj = config.get_profile(profile_name);
        let profile_schema = loaded.schema_for(profile_type);
        let profile_secure = config.secure_props_for_profile(profile_name);

        let base_name = config.active_profile_name("base", Some(&params.arguments), None);
        let base_obj = config.get_profile(&base_name);
        let base_secure = config.secure_props_for_profile(&base_name);
        let profile_exists = config.profile_exists(profile_name);
        let base_exists = config.profile_exists(&base_name);

        let mut stored = Vec::new();
        for prop in &profile_props {
            let mut prop_profile_path = profile_path.clone();
            let mut is_secure = profile_schema
                .and_then(|s| s.property(prop))
                .is_some_and(|p| p.secure)
                || profile_secure.contains(prop);

            let in_profile = profile_obj.contains_key(prop) || profile_secure.contains(prop);
            let in_base = base_obj.contains_key(prop) || base_secure.contains(prop);
            let token_type_in_base_only =
                !profile_obj.contains_key("tokenType") && base_obj.contains_key("tokenType");

            if (!profile_exists && base_exists)
                || (!in_profile && in_base)
                || (prop == "tokenValue" && token_type_in_base_only)
                || profile_type == "base"
            {
                prop_profile_path = profile_path_from_name(&base_name);
                is_secure = loaded.is_secure(Some("base"), prop) || base_secure.contains(prop);
            }

            if is_secure {
                let full = format!("{}.properties.{}", prop_profile_path, prop);
                if let Some(info) = config.secure_info_for_prop(&full, true) {
                    let secure_profile_path = info
                        .path
                        .strip_suffix(&format!(".properties.{}", prop))
                        .unwrap_or(&info.path)
                        .to_string();
                    if secure_profile_path.split('.').count() < prop_profile_path.split('.').count() {
                        prop_profile_path = secure_profile_path;
                    }
                }
            }

            let sess_name = get_prop_nm_for(prop, PropUse::SessCfg);
            let Some(value) = sess.get_prop(&sess_name) else {
                debug!("Session has no value for {}; not storing it", sess_name);
                continue;
            };
            config.set(
                &format!("{}.properties.{}", prop_profile_path, prop),
                value,
                is_secure,
            )?;
            stored.push(prop.clone());
        }

        if stored.is_empty() {
            return Ok(());
        }

        let vault = self.imperative.vault().map(|v| &**v);
        config.save(vault).await?;

        let message = format!(
            "Stored properties in {}: {}",
            config.active_layer().display_path(),
            stored.join(", ")
        );
        match &params.console {
            Some(console) => console.show_message(&message),
            None => info!("{}", message),
        }
        Ok(())
    }
}

#[async_trait]
impl AutoStore for ConfigAutoStore {
    async fn store_sess_cfg_props(
        &self,
        params: &HandlerContext,
        sess: &mut SessionConfig,
        prop_names: &[String],
    ) -> ImperativeResult<()> {
        if prop_names.is_empty() {
            return Ok(());
        }
        let Some(lock) = self.imperative.config() else {
            return Ok(());
        };
        let mut config = lock.write().await;
        if !config.exists() || !config.auto_store() {
            debug!("Auto-store skipped: no team config or autoStore is off");
            return Ok(());
        }

        let profile_props: Vec<String> = prop_names
            .iter()
            .map(|name| get_prop_nm_for(name, PropUse::Profile))
            .collect();
        let Some((profile_type, profile_name)) =
            self.active_profile_in(Some(&config), params, &profile_props)
        else {
            debug!("No profile of this command defines {:?}", profile_props);
            return Ok(());
        };

        let before = {
            let layer = config.active_layer();
            (layer.user, layer.global)
        };
        let result = self
            .store_in_active_layer(
                &mut config,
                params,
                sess,
                &profile_type,
                &profile_name,
                profile_props,
            )
            .await;
        config.activate(before.0, before.1);
        result
    }
}

#[cfg(test)]
mod tests;
