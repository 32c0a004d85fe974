//! Options controlling connection property resolution

use super::auth_type::{AuthType, TOKEN_TYPE_JWT};
use crate::error::ImperativeResult;
use crate::prompt::HandlerContext;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Service description used in prompts when none is given
pub const DEFAULT_SERVICE_DESCRIPTION: &str = "your service";

/// Supplies values for properties instead of interactive prompts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ValuesProvider: Send + Sync {
    /// Return values for (some of) the named session properties
    async fn get_values(&self, prop_names: &[String]) -> ImperativeResult<BTreeMap<String, Value>>;
}

/// One property that suppresses others when it has a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyOverride {
    /// Session property that takes precedence
    pub property_name: String,
    /// Session properties cleared when `property_name` has a value
    pub properties_overridden: Vec<String>,
    /// Argument name carrying the controlling value, when it differs
    pub argument_name: Option<String>,
}

impl PropertyOverride {
    /// Create a rule
    pub fn new<I, S>(property_name: impl Into<String>, properties_overridden: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            property_name: property_name.into(),
            properties_overridden: properties_overridden.into_iter().map(Into::into).collect(),
            argument_name: None,
        }
    }

    /// Read the controlling value from a differently-named argument
    pub fn with_argument_name(mut self, argument_name: impl Into<String>) -> Self {
        self.argument_name = Some(argument_name.into());
        self
    }

    /// Argument name of the controlling property
    pub fn argument_name(&self) -> &str {
        self.argument_name.as_deref().unwrap_or(&self.property_name)
    }
}

/// Validator for a custom prompt answer
pub type ValueValidator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// An extra property the caller wants prompted for
#[derive(Clone)]
pub struct PromptProp {
    /// Session property name
    pub name: String,
    /// `Some(false)` marks the property as not secure; anything else is secure
    pub secure: Option<bool>,
    /// Text shown instead of `Enter your <name> for`
    pub description: Option<String>,
    /// Answers failing this check are dropped
    pub is_given_value_valid: Option<ValueValidator>,
}

impl PromptProp {
    /// Create a prompt for a property
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secure: None,
            description: None,
            is_given_value_valid: None,
        }
    }

    /// Set whether the property is secure
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Set the prompt description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set a validator
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.is_given_value_valid = Some(Arc::new(validator));
        self
    }

    /// Whether the property is treated as secure
    pub fn is_secure(&self) -> bool {
        self.secure != Some(false)
    }

    /// Whether an answer passes the validator
    pub fn accepts(&self, value: &Value) -> bool {
        self.is_given_value_valid
            .as_ref()
            .is_none_or(|validate| validate(value))
    }
}

impl fmt::Debug for PromptProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptProp")
            .field("name", &self.name)
            .field("secure", &self.secure)
            .field("description", &self.description)
            .field("has_validator", &self.is_given_value_valid.is_some())
            .finish()
    }
}

/// Options for [`ConnectionPropsForSessCfg::add_props_or_prompt`](super::conn_props::ConnectionPropsForSessCfg::add_props_or_prompt)
#[derive(Clone)]
pub struct ConnectionOptions {
    /// Credentials are inputs to a login that yields a token
    pub request_token: bool,
    /// Prompt interactively for missing properties
    pub do_prompting: bool,
    /// Token type used when requesting a token without one
    pub default_token_type: String,
    /// Override rules
    pub property_overrides: Vec<PropertyOverride>,
    /// Extra properties to prompt for
    pub props_to_prompt_for: Vec<PromptProp>,
    /// Restricts the auth order to exactly these types
    pub supported_auth_types: Option<Vec<AuthType>>,
    /// Replaces interactive prompting
    pub get_values_back: Option<Arc<dyn ValuesProvider>>,
    /// `Some(false)` disables storing prompted values
    pub auto_store: Option<bool>,
    /// Service named in prompts and errors
    pub service_description: Option<String>,
    /// Handler context of the running command
    pub parms: Option<HandlerContext>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            request_token: false,
            do_prompting: true,
            default_token_type: TOKEN_TYPE_JWT.to_string(),
            property_overrides: Vec::new(),
            props_to_prompt_for: Vec::new(),
            supported_auth_types: None,
            get_values_back: None,
            auto_store: None,
            service_description: None,
            parms: None,
        }
    }
}

impl ConnectionOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_token(mut self, request_token: bool) -> Self {
        self.request_token = request_token;
        self
    }

    pub fn with_do_prompting(mut self, do_prompting: bool) -> Self {
        self.do_prompting = do_prompting;
        self
    }

    pub fn with_default_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.default_token_type = token_type.into();
        self
    }

    pub fn with_property_override(mut self, rule: PropertyOverride) -> Self {
        self.property_overrides.push(rule);
        self
    }

    pub fn with_prompt_prop(mut self, prop: PromptProp) -> Self {
        self.props_to_prompt_for.push(prop);
        self
    }

    pub fn with_supported_auth_types(mut self, auth_types: Vec<AuthType>) -> Self {
        self.supported_auth_types = Some(auth_types);
        self
    }

    pub fn with_values_provider(mut self, provider: Arc<dyn ValuesProvider>) -> Self {
        self.get_values_back = Some(provider);
        self
    }

    pub fn with_auto_store(mut self, auto_store: bool) -> Self {
        self.auto_store = Some(auto_store);
        self
    }

    pub fn with_service_description(mut self, description: impl Into<String>) -> Self {
        self.service_description = Some(description.into());
        self
    }

    pub fn with_parms(mut self, parms: HandlerContext) -> Self {
        self.parms = Some(parms);
        self
    }

    /// Service description for prompts and errors
    pub fn service(&self) -> &str {
        self.service_description
            .as_deref()
            .unwrap_or(DEFAULT_SERVICE_DESCRIPTION)
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("request_token", &self.request_token)
            .field("do_prompting", &self.do_prompting)
            .field("default_token_type", &self.default_token_type)
            .field("property_overrides", &self.property_overrides)
            .field("props_to_prompt_for", &self.props_to_prompt_for)
            .field("supported_auth_types", &self.supported_auth_types)
            .field("get_values_back", &self.get_values_back.is_some())
            .field("auto_store", &self.auto_store)
            .field("service_description", &self.service_description)
            .field("parms", &self.parms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let opts = ConnectionOptions::default();
        assert!(!opts.request_token);
        assert!(opts.do_prompting);
        assert_eq!(opts.default_token_type, "jwtToken");
        assert_eq!(opts.service(), "your service");
    }

    #[test]
    fn test_prompt_prop_secure_by_default() {
        assert!(PromptProp::new("keyPassphrase").is_secure());
        assert!(!PromptProp::new("privateKey").with_secure(false).is_secure());
    }

    #[test]
    fn test_prompt_prop_validator() {
        let prop = PromptProp::new("encoding").with_validator(|v| v.as_str() == Some("IBM-1047"));
        assert!(prop.accepts(&json!("IBM-1047")));
        assert!(!prop.accepts(&json!("UTF-8")));
        assert!(PromptProp::new("x").accepts(&json!("anything")));
    }

    #[test]
    fn test_override_argument_name() {
        let rule = PropertyOverride::new("privateKey", ["password"]);
        assert_eq!(rule.argument_name(), "privateKey");
        let rule = rule.with_argument_name("private-key");
        assert_eq!(rule.argument_name(), "private-key");
    }
}
