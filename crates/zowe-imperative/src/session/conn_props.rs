//! Connection property resolution
//!
//! [`ConnectionPropsForSessCfg::add_props_or_prompt`] turns a partial session
//! config plus command arguments into a session config that can connect:
//!
//! 1. Command-line host, port, user and password win over the caller's
//!    values; the credentials available now are merged and an auth type is
//!    chosen.
//! 2. Override rules clear suppressed properties; whatever is still missing
//!    (host, port, the credentials of the preferred auth type and any extra
//!    properties the caller asked for) is obtained from a values provider or
//!    by prompting. Prompted values may be stored back in team config.
//!
//! Credentials are merged again after every step, so values obtained later
//! take part in auth type selection.

use super::args::{CommandArguments, has_value};
use super::auth_order::{
    self, PropUse, add_creds_to_session, add_creds_to_session_async, cache_creds_and_auth_order,
    get_auth_order, get_prop_nm_for, making_request_for_token, put_top_auth_in_session,
};
use super::auth_type::AuthType;
use super::config::SessionConfig;
use super::options::{ConnectionOptions, PromptProp, PropertyOverride};
use super::secure_props::SecurePropRegistry;
use crate::config::{AutoStore, ConfigAutoStore, CredentialVault, ImperativeConfig};
use crate::error::{ImperativeError, ImperativeResult};
use crate::prompt::{PromptOptions, Prompter};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Shown before prompting when only legacy profiles exist
pub const V1_PROFILES_MESSAGE: &str = "Only V1 profiles exist. V1 profiles are no longer supported. You should convert your V1 profiles to a newer Zowe client configuration. Therefore, you will be asked for the connection properties that are required to complete your command.";

/// Shown before prompting when there is no team config
pub const NO_CONFIG_MESSAGE: &str = "No Zowe client configuration exists. Therefore, you will be asked for the connection properties that are required to complete your command.";

/// Shown before prompting when team config lacks some properties
pub const MISSING_PROPS_MESSAGE: &str = "Some required connection properties have not been specified in your Zowe client configuration. Therefore, you will be asked for the connection properties that are required to complete your command.";

/// Session and arguments after override rules were applied
#[derive(Debug, Clone)]
pub struct Overridden {
    pub session: SessionConfig,
    pub args: CommandArguments,
    /// Session property names cleared by a rule
    pub suppressed: BTreeSet<String>,
}

/// Apply property override rules.
///
/// For each rule whose controlling property has a value in the session or
/// the arguments, the value is placed in the session and every overridden
/// property is removed from the session, the arguments and the auth cache.
pub fn apply_overrides(
    sess: &SessionConfig,
    args: &CommandArguments,
    rules: &[PropertyOverride],
) -> ImperativeResult<Overridden> {
    let mut session = sess.clone();
    let mut args = args.clone();
    let mut suppressed = BTreeSet::new();

    for rule in rules {
        let controlling = session
            .get_prop(&rule.property_name)
            .filter(has_value)
            .or_else(|| args.get(rule.argument_name()).filter(|v| has_value(v)).cloned());
        let Some(value) = controlling else {
            continue;
        };

        session.set_prop(&rule.property_name, value)?;
        for name in &rule.properties_overridden {
            session.clear_prop(name);
            args.remove(name);
            args.remove(&get_prop_nm_for(name, PropUse::CmdArgs));
            session.auth_cache.available_creds.remove(name);
            suppressed.insert(name.clone());
        }
        debug!(
            "{} overrides {:?}",
            rule.property_name, rule.properties_overridden
        );
    }

    Ok(Overridden {
        session,
        args,
        suppressed,
    })
}

/// Whether the session holds credentials of any kind
pub fn sess_has_creds(sess: &SessionConfig) -> bool {
    sess.has_prop("tokenValue")
        || (sess.has_prop("cert") && sess.has_prop("certKey"))
        || sess.has_prop("base64EncodedAuth")
        || (sess.has_prop("user") && sess.has_prop("password"))
}

/// Text of the prompt for one property
pub fn prompt_text(name: &str, description: Option<&str>, service: &str, hidden: bool) -> String {
    let lead = match description {
        Some(description) => description.to_string(),
        None => match name {
            "hostname" | "host" => "Enter the host name of".to_string(),
            "port" => "Enter the port number for".to_string(),
            "user" => "Enter the user name for".to_string(),
            "password" => "Enter the password for".to_string(),
            "tokenType" => "Enter the token type for".to_string(),
            "tokenValue" => "Enter the token value for".to_string(),
            "cert" | "certFile" => "Enter the certificate file for".to_string(),
            "certKey" | "certKeyFile" => "Enter the certificate key file for".to_string(),
            other => format!("Enter your {} for", other),
        },
    };
    format!(
        "{} {}{}: ",
        lead,
        service,
        if hidden { " (will be hidden)" } else { "" }
    )
}

/// Resolves connection properties for a session config
#[derive(Clone)]
pub struct ConnectionPropsForSessCfg {
    secure_props: SecurePropRegistry,
    imperative: Option<Arc<ImperativeConfig>>,
    auto_store: Option<Arc<dyn AutoStore>>,
    prompter: Arc<dyn Prompter>,
}

impl ConnectionPropsForSessCfg {
    /// Create a resolver that prompts through `prompter`
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self {
            secure_props: SecurePropRegistry::new(),
            imperative: None,
            auto_store: None,
            prompter,
        }
    }

    /// Use the process team config for secure names, schemas and auto-store
    pub fn with_imperative(mut self, imperative: Arc<ImperativeConfig>) -> Self {
        if self.auto_store.is_none() {
            self.auto_store = Some(Arc::new(ConfigAutoStore::new(imperative.clone())));
        }
        self.imperative = Some(imperative);
        self
    }

    pub fn with_auto_store(mut self, auto_store: Arc<dyn AutoStore>) -> Self {
        self.auto_store = Some(auto_store);
        self
    }

    /// Share a secure property registry with other resolvers
    pub fn with_secure_props(mut self, secure_props: SecurePropRegistry) -> Self {
        self.secure_props = secure_props;
        self
    }

    pub fn secure_props(&self) -> &SecurePropRegistry {
        &self.secure_props
    }

    fn vault(&self) -> Option<&dyn CredentialVault> {
        self.imperative
            .as_ref()
            .and_then(|imperative| imperative.vault())
            .map(|vault| &**vault)
    }

    /// Produce a session config with everything needed to connect.
    ///
    /// The caller's config is not modified. Fails on a prompt timeout, a
    /// non-numeric answer for a numeric property, a connection property still
    /// missing after values were requested, or a failed vault lookup.
    /// Temporary certificate files created along the way are deleted when
    /// resolution fails.
    pub async fn add_props_or_prompt(
        &self,
        initial_sess_cfg: &SessionConfig,
        cmd_args: &CommandArguments,
        conn_opts: ConnectionOptions,
    ) -> ImperativeResult<SessionConfig> {
        let mut sess = initial_sess_cfg.clone();
        self.resolve_sess_cfg_props(&mut sess, cmd_args, &conn_opts)?;

        let Overridden {
            session,
            args,
            suppressed,
        } = apply_overrides(&sess, cmd_args, &conn_opts.property_overrides)?;
        let mut sess = session;
        let inherited_files = sess.auth_cache.temp_files.len();
        if let Err(e) = self
            .complete_sess_cfg(&mut sess, &args, &suppressed, &conn_opts)
            .await
        {
            auth_order::remove_temp_files_from(&mut sess, inherited_files);
            return Err(e);
        }

        debug!(
            "Creating a session config with these properties: {}",
            self.secure_props.censor(&sess.to_value())
        );
        Ok(sess)
    }

    /// Merge vault credentials, obtain missing values and select the auth type
    async fn complete_sess_cfg(
        &self,
        sess: &mut SessionConfig,
        args: &CommandArguments,
        suppressed: &BTreeSet<String>,
        conn_opts: &ConnectionOptions,
    ) -> ImperativeResult<()> {
        add_creds_to_session_async(sess, args, self.vault()).await?;

        let prompt_for = self.props_to_prompt_for(sess, conn_opts, suppressed);
        if !prompt_for.is_empty() {
            self.load_secure_sess_cfg_props(conn_opts, args).await;
            let answers = self.obtain_values(&prompt_for, conn_opts).await?;
            let committed = self.commit_answers(sess, &prompt_for, answers, conn_opts)?;
            if conn_opts.get_values_back.is_some() || conn_opts.do_prompting {
                ensure_connection_props(sess, &prompt_for, conn_opts)?;
            }
            self.auto_store_committed(sess, &committed, conn_opts).await?;
        }

        add_creds_to_session_async(sess, args, self.vault()).await?;
        let order = get_auth_order(sess);
        if sess.auth_type == Some(AuthType::None) && !order.contains(&AuthType::None) {
            put_top_auth_in_session(sess);
        }
        Ok(())
    }

    /// First pass: command-line values, token request and supported auth types
    fn resolve_sess_cfg_props(
        &self,
        sess: &mut SessionConfig,
        cmd_args: &CommandArguments,
        conn_opts: &ConnectionOptions,
    ) -> ImperativeResult<()> {
        if conn_opts.request_token {
            making_request_for_token(sess);
            if !sess.has_prop("tokenType") {
                let token_type = cmd_args
                    .get_str("tokenType")
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| conn_opts.default_token_type.clone());
                sess.token_type = Some(token_type);
            }
        }

        for (arg_name, sess_name) in [
            ("host", "hostname"),
            ("port", "port"),
            ("user", "user"),
            ("password", "password"),
        ] {
            if let Some(value) = cmd_args.get(arg_name).filter(|v| has_value(v)) {
                sess.set_prop(sess_name, value.clone())?;
            }
        }

        add_creds_to_session(sess, cmd_args);

        if let Some(supported) = &conn_opts.supported_auth_types {
            let mut order: Vec<AuthType> = Vec::new();
            for auth in supported {
                if !order.contains(auth) {
                    order.push(*auth);
                }
            }
            sess.auth_type_order = order;
            sess.auth_cache.did_user_set_auth_order = true;
            cache_creds_and_auth_order(sess, cmd_args);
            put_top_auth_in_session(sess);
        }
        Ok(())
    }

    /// Names of the session properties still missing, in prompt order
    fn props_to_prompt_for(
        &self,
        sess: &mut SessionConfig,
        conn_opts: &ConnectionOptions,
        suppressed: &BTreeSet<String>,
    ) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !suppressed.contains(name) && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        };

        for prop in &conn_opts.props_to_prompt_for {
            if !sess.has_prop(&prop.name) {
                push(&prop.name);
            }
        }
        if !sess.has_prop("hostname") {
            push("hostname");
        }
        // a zero port is an unset default, not a real port
        if !sess.has_prop("port") || sess.port == Some(0) {
            push("port");
        }

        let order = get_auth_order(sess);
        let resolved_none = sess.auth_type.is_none_or(|t| t == AuthType::None);
        if resolved_none && !order.contains(&AuthType::None) {
            let requesting = auth_order::is_requesting_token(sess);
            let first = order
                .iter()
                .copied()
                .filter(|auth| *auth != AuthType::CertPfx)
                .find(|auth| !(requesting && auth.is_token_based()))
                .unwrap_or(AuthType::Basic);
            for cred_name in first.required_props() {
                let available = sess
                    .auth_cache
                    .available_creds
                    .get(*cred_name)
                    .is_some_and(|v| !v.is_empty());
                if !available {
                    push(cred_name);
                }
            }
        }
        names
    }

    /// Record secure property names of the profiles in use
    async fn load_secure_sess_cfg_props(
        &self,
        conn_opts: &ConnectionOptions,
        args: &CommandArguments,
    ) {
        let Some(imperative) = &self.imperative else {
            return;
        };
        let service_type = conn_opts
            .parms
            .as_ref()
            .and_then(|parms| parms.profile_types().next().cloned());
        let profile_types: Vec<String> = service_type
            .into_iter()
            .chain(std::iter::once("base".to_string()))
            .collect();

        let loaded = imperative.loaded_config();
        for profile_type in &profile_types {
            if let Some(schema) = loaded.schema_for(profile_type) {
                for (name, prop) in &schema.properties {
                    if prop.secure {
                        self.secure_props.add(get_prop_nm_for(name, PropUse::SessCfg));
                    }
                }
            }
        }

        let Some(lock) = imperative.config() else {
            return;
        };
        let config = lock.read().await;
        for profile_type in &profile_types {
            let profile_name = config.active_profile_name(profile_type, Some(args), None);
            for name in config.secure_props_for_profile(&profile_name) {
                self.secure_props.add(get_prop_nm_for(&name, PropUse::SessCfg));
            }
        }
    }

    /// Ask the values provider, or the user when prompting is allowed
    async fn obtain_values(
        &self,
        prompt_for: &[String],
        conn_opts: &ConnectionOptions,
    ) -> ImperativeResult<BTreeMap<String, Value>> {
        if let Some(provider) = &conn_opts.get_values_back {
            return provider.get_values(prompt_for).await;
        }
        if !conn_opts.do_prompting {
            debug!("Prompting is disabled; not asking for {:?}", prompt_for);
            return Ok(BTreeMap::new());
        }

        let console = conn_opts
            .parms
            .as_ref()
            .and_then(|parms| parms.console.clone())
            .unwrap_or_else(|| self.prompter.clone());
        console.show_message(self.explanation().await);

        let sec_to_wait = self
            .imperative
            .as_ref()
            .map(|imperative| imperative.settings().prompt_timeout_secs);

        let mut answers = BTreeMap::new();
        for name in prompt_for {
            let custom = custom_prop(conn_opts, name);
            let hidden =
                self.secure_props.is_censored(name) || custom.is_some_and(PromptProp::is_secure);
            let text = prompt_text(
                name,
                custom.and_then(|p| p.description.as_deref()),
                conn_opts.service(),
                hidden,
            );
            let mut options = if hidden {
                PromptOptions::hidden()
            } else {
                PromptOptions::default()
            };
            options.sec_to_wait = sec_to_wait;

            // connection properties are asked again until answered
            let answer = loop {
                let answer = console
                    .prompt(&text, options.clone())
                    .await?
                    .ok_or_else(|| ImperativeError::prompt_timeout(name.as_str()))?;
                if !answer.is_empty() || custom.is_some() {
                    break answer;
                }
            };
            if answer.is_empty() {
                continue;
            }
            answers.insert(name.clone(), Value::String(answer));
        }
        Ok(answers)
    }

    async fn explanation(&self) -> &'static str {
        match &self.imperative {
            Some(imperative) if imperative.only_v1_profiles_exist().await => V1_PROFILES_MESSAGE,
            Some(imperative) if imperative.config_exists().await => MISSING_PROPS_MESSAGE,
            _ => NO_CONFIG_MESSAGE,
        }
    }

    /// Validate answers and write them into the session.
    ///
    /// Returns the names that were committed.
    fn commit_answers(
        &self,
        sess: &mut SessionConfig,
        prompt_for: &[String],
        mut answers: BTreeMap<String, Value>,
        conn_opts: &ConnectionOptions,
    ) -> ImperativeResult<Vec<String>> {
        let mut committed = Vec::new();
        for name in prompt_for {
            let Some(value) = answers.remove(name).filter(has_value) else {
                continue;
            };
            if let Some(custom) = custom_prop(conn_opts, name) {
                if !custom.accepts(&value) {
                    debug!("Discarding the value given for {}: it failed validation", name);
                    continue;
                }
            }
            let value = if self.is_numeric(name, conn_opts) {
                coerce_number(name, value)?
            } else {
                value
            };
            sess.set_prop(name, value)?;
            committed.push(name.clone());
        }
        Ok(committed)
    }

    fn is_numeric(&self, name: &str, conn_opts: &ConnectionOptions) -> bool {
        if name == "port" {
            return true;
        }
        let Some(imperative) = &self.imperative else {
            return false;
        };
        let profile_type = conn_opts
            .parms
            .as_ref()
            .and_then(|parms| parms.profile_types().next().cloned());
        imperative
            .loaded_config()
            .is_numeric(profile_type.as_deref(), &get_prop_nm_for(name, PropUse::Profile))
    }

    async fn auto_store_committed(
        &self,
        sess: &mut SessionConfig,
        committed: &[String],
        conn_opts: &ConnectionOptions,
    ) -> ImperativeResult<()> {
        if committed.is_empty() || conn_opts.auto_store == Some(false) {
            return Ok(());
        }
        let (Some(parms), Some(auto_store)) = (&conn_opts.parms, &self.auto_store) else {
            return Ok(());
        };

        let had_token = sess.has_prop("tokenValue");
        auto_store
            .store_sess_cfg_props(parms, sess, committed)
            .await?;

        if !had_token && sess.has_prop("tokenValue") {
            // credentials were exchanged for a token while storing
            for cred_name in ["user", "password", "base64EncodedAuth"] {
                sess.auth_cache.available_creds.remove(cred_name);
            }
            auth_order::cache_default_auth_order(sess, AuthType::Token);
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionPropsForSessCfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPropsForSessCfg")
            .field("secure_props", &self.secure_props)
            .field("imperative", &self.imperative)
            .field("auto_store", &self.auto_store.is_some())
            .finish()
    }
}

/// Fail on the first requested connection property that is still unset
fn ensure_connection_props(
    sess: &SessionConfig,
    prompt_for: &[String],
    conn_opts: &ConnectionOptions,
) -> ImperativeResult<()> {
    let missing = prompt_for
        .iter()
        .filter(|name| custom_prop(conn_opts, name).is_none())
        .find(|name| !sess.has_prop(name) || (name.as_str() == "port" && sess.port == Some(0)));
    match missing {
        Some(name) => Err(ImperativeError::missing_property(
            name.as_str(),
            conn_opts.service(),
        )),
        None => Ok(()),
    }
}

fn custom_prop<'a>(conn_opts: &'a ConnectionOptions, name: &str) -> Option<&'a PromptProp> {
    conn_opts.props_to_prompt_for.iter().find(|p| p.name == name)
}

/// Number coercion for prompted numeric properties
fn coerce_number(name: &str, value: Value) -> ImperativeResult<Value> {
    let text = match value {
        Value::Number(_) => return Ok(value),
        Value::String(text) => text,
        other => other.to_string(),
    };
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(Value::from(n));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Value::from)
        .ok_or_else(|| ImperativeError::invalid_number(name, text.as_str()))
}
