//! Session configuration record and its credential cache

use super::auth_type::AuthType;
use crate::error::{ImperativeError, ImperativeResult};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// Deferred credential lookup, typically backed by a credential vault
pub type DeferredCredential =
    Arc<dyn Fn() -> BoxFuture<'static, ImperativeResult<String>> + Send + Sync>;

/// Where a vault account name comes from
#[derive(Clone)]
pub enum CredentialSource {
    /// The account name is known up front
    Literal(String),
    /// The account name must be awaited
    Deferred(DeferredCredential),
}

impl CredentialSource {
    /// Create a literal source
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a deferred source from an async closure
    pub fn deferred<F, Fut>(lookup: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ImperativeResult<String>> + Send + 'static,
    {
        Self::Deferred(Arc::new(move || Box::pin(lookup())))
    }

    /// Materialize the value. Errors from a deferred lookup propagate unchanged.
    pub async fn resolve(&self) -> ImperativeResult<String> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Deferred(lookup) => lookup().await,
        }
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Internal bookkeeping the auth order resolver keeps on a session config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthCache {
    /// Credential kind -> materialized value
    pub available_creds: BTreeMap<String, String>,
    /// Once set, the auth order is never reordered automatically
    pub did_user_set_auth_order: bool,
    /// Auth type placed first when a default order is built
    pub top_default_auth: Option<AuthType>,
    /// Present while a token is being requested; holds the login mechanism
    /// once one is selected (`None` is the placeholder)
    pub auth_type_to_request_token: Option<AuthType>,
    /// Temporary certificate files owned by this session config
    pub temp_files: Vec<PathBuf>,
}

/// Connection target plus credentials, enriched across resolver passes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_encoded_auth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_unauthorized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<AuthType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth_type_order: Vec<AuthType>,

    /// Vault account holding the certificate
    #[serde(skip)]
    pub cert_account: Option<CredentialSource>,
    /// Vault account holding the certificate key
    #[serde(skip)]
    pub cert_key_account: Option<CredentialSource>,
    /// Fallback vault account: the profile name
    #[serde(skip)]
    pub profile: Option<String>,
    /// Fallback vault account
    #[serde(skip)]
    pub account: Option<String>,

    /// Service-specific properties (`privateKey`, `keyPassphrase`, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,

    #[serde(skip)]
    pub auth_cache: AuthCache,
}

impl SessionConfig {
    /// Create an empty session config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host name
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set user and password
    pub fn with_basic_creds(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Set token type and value
    pub fn with_token(mut self, token_type: impl Into<String>, token_value: impl Into<String>) -> Self {
        self.token_type = Some(token_type.into());
        self.token_value = Some(token_value.into());
        self
    }

    /// Set the caller's auth order
    pub fn with_auth_type_order(mut self, order: Vec<AuthType>) -> Self {
        self.auth_type_order = order;
        self
    }

    /// Set the certificate vault accounts
    pub fn with_cert_accounts(mut self, cert: CredentialSource, cert_key: CredentialSource) -> Self {
        self.cert_account = Some(cert);
        self.cert_key_account = Some(cert_key);
        self
    }

    fn string_slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "hostname" => Some(&mut self.hostname),
            "protocol" => Some(&mut self.protocol),
            "user" => Some(&mut self.user),
            "password" => Some(&mut self.password),
            "base64EncodedAuth" => Some(&mut self.base64_encoded_auth),
            "tokenType" => Some(&mut self.token_type),
            "tokenValue" => Some(&mut self.token_value),
            "cert" => Some(&mut self.cert),
            "certKey" => Some(&mut self.cert_key),
            "basePath" => Some(&mut self.base_path),
            _ => None,
        }
    }

    /// Read a property by its session-side name
    pub fn get_prop(&self, name: &str) -> Option<Value> {
        let text = |v: &Option<String>| v.clone().map(Value::String);
        match name {
            "hostname" => text(&self.hostname),
            "protocol" => text(&self.protocol),
            "user" => text(&self.user),
            "password" => text(&self.password),
            "base64EncodedAuth" => text(&self.base64_encoded_auth),
            "tokenType" => text(&self.token_type),
            "tokenValue" => text(&self.token_value),
            "cert" => text(&self.cert),
            "certKey" => text(&self.cert_key),
            "basePath" => text(&self.base_path),
            "port" => self.port.map(Value::from),
            "rejectUnauthorized" => self.reject_unauthorized.map(Value::Bool),
            "type" => self.auth_type.map(|t| Value::String(t.as_str().to_string())),
            _ => self.extra.get(name).cloned(),
        }
    }

    /// Read a property as a string, if it is one
    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.get_prop(name)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Whether a property holds a value (non-null, non-empty string)
    pub fn has_prop(&self, name: &str) -> bool {
        self.get_prop(name).is_some_and(|v| super::args::has_value(&v))
    }

    /// Write a property by its session-side name. `null` clears it.
    pub fn set_prop(&mut self, name: &str, value: Value) -> ImperativeResult<()> {
        if value.is_null() {
            self.clear_prop(name);
            return Ok(());
        }

        if let Some(slot) = self.string_slot(name) {
            *slot = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
            return Ok(());
        }

        match name {
            "port" => {
                self.port = Some(value_to_port(&value)?);
            }
            "rejectUnauthorized" => {
                self.reject_unauthorized = Some(match &value {
                    Value::Bool(b) => *b,
                    Value::String(s) => !s.eq_ignore_ascii_case("false"),
                    _ => true,
                });
            }
            "type" => {
                let text = value.as_str().unwrap_or_default();
                self.auth_type = Some(text.parse::<AuthType>().map_err(|e| {
                    ImperativeError::invalid_input_field(e, "type")
                })?);
            }
            _ => {
                self.extra.insert(name.to_string(), value);
            }
        }
        Ok(())
    }

    /// Remove a property by its session-side name
    pub fn clear_prop(&mut self, name: &str) {
        if let Some(slot) = self.string_slot(name) {
            *slot = None;
            return;
        }
        match name {
            "port" => self.port = None,
            "rejectUnauthorized" => self.reject_unauthorized = None,
            "type" => self.auth_type = None,
            _ => {
                self.extra.remove(name);
            }
        }
    }

    /// Snapshot of every plain property, secure values included
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Coerce a JSON value into a port number
pub(crate) fn value_to_port(value: &Value) -> ImperativeResult<u16> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        let shown = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        ImperativeError::invalid_number("port", shown)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get_by_name() {
        let mut sess = SessionConfig::new();
        sess.set_prop("hostname", json!("lpar1.example.com")).unwrap();
        sess.set_prop("port", json!("1443")).unwrap();
        sess.set_prop("rejectUnauthorized", json!(false)).unwrap();
        sess.set_prop("privateKey", json!("~/.ssh/id_rsa")).unwrap();

        assert_eq!(sess.hostname.as_deref(), Some("lpar1.example.com"));
        assert_eq!(sess.port, Some(1443));
        assert_eq!(sess.reject_unauthorized, Some(false));
        assert_eq!(sess.get_prop("privateKey"), Some(json!("~/.ssh/id_rsa")));
        assert_eq!(sess.get_prop("port"), Some(json!(1443)));
    }

    #[test]
    fn test_null_clears() {
        let mut sess = SessionConfig::new().with_basic_creds("alice", "pw1");
        sess.set_prop("password", Value::Null).unwrap();
        assert!(sess.password.is_none());
        assert!(sess.has_prop("user"));
        assert!(!sess.has_prop("password"));
    }

    #[test]
    fn test_empty_string_has_no_value() {
        let sess = SessionConfig::new().with_hostname("");
        assert!(!sess.has_prop("hostname"));
    }

    #[test]
    fn test_bad_port() {
        let mut sess = SessionConfig::new();
        let err = sess.set_prop("port", json!("abc")).unwrap_err();
        assert!(matches!(err, ImperativeError::InvalidNumber { .. }));
        assert!(sess.port.is_none());
    }

    #[test]
    fn test_serialization_skips_cache_and_accounts() {
        let mut sess = SessionConfig::new()
            .with_hostname("host")
            .with_cert_accounts(CredentialSource::literal("a"), CredentialSource::literal("b"));
        sess.auth_type = Some(AuthType::Basic);
        sess.auth_cache
            .available_creds
            .insert("user".to_string(), "alice".to_string());

        let value = sess.to_value();
        assert_eq!(value, json!({"hostname": "host", "type": "basic"}));
    }

    #[tokio::test]
    async fn test_deferred_source_resolves() {
        let source = CredentialSource::deferred(|| async { Ok("acct1".to_string()) });
        assert_eq!(source.resolve().await.unwrap(), "acct1");
        assert_eq!(format!("{:?}", source), "Deferred(..)");
    }

    #[tokio::test]
    async fn test_deferred_source_propagates_error() {
        let source =
            CredentialSource::deferred(|| async { Err(ImperativeError::credential("locked")) });
        let err = source.resolve().await.unwrap_err();
        assert!(matches!(err, ImperativeError::Credential { .. }));
    }
}
