//! Validated session built from a resolved session config

use super::auth_type::{AuthType, HTTP_PROTOCOL, HTTPS_PROTOCOL};
use super::config::SessionConfig;
use crate::error::{ImperativeError, ImperativeResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub const DEFAULT_HTTP_PORT: u16 = 80;
pub const DEFAULT_HTTPS_PORT: u16 = 443;
pub const DEFAULT_BASE_PATH: &str = "";
pub const DEFAULT_REJECT_UNAUTHORIZED: bool = true;

const LOGIN_HINT: &str = "For CLI usage, see 'zowe auth login <service> --help'";

/// `user:password` encoded as base64
pub fn get_base64_auth(user: &str, password: &str) -> String {
    STANDARD.encode(format!("{}:{}", user, password))
}

fn decode_auth(auth: &str) -> ImperativeResult<String> {
    let encoded = auth
        .strip_prefix("Basic ")
        .or_else(|| auth.strip_prefix("Basic"))
        .unwrap_or(auth)
        .trim();
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| ImperativeError::session(format!("Invalid base64 credentials: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|_| ImperativeError::session("Base64 credentials are not valid UTF-8"))
}

/// User name part of base64 credentials
pub fn get_username_from_auth(auth: &str) -> ImperativeResult<String> {
    let decoded = decode_auth(auth)?;
    Ok(match decoded.rfind(':') {
        Some(idx) => decoded[..idx].to_string(),
        None => String::new(),
    })
}

/// Password part of base64 credentials
pub fn get_password_from_auth(auth: &str) -> ImperativeResult<String> {
    let decoded = decode_auth(auth)?;
    Ok(match decoded.rfind(':') {
        Some(idx) => decoded[idx + 1..].to_string(),
        None => decoded,
    })
}

/// A session whose connection settings have defaults filled in and whose
/// credentials match its auth type
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
}

impl Session {
    /// Fill defaults and validate
    pub fn new(config: SessionConfig) -> ImperativeResult<Self> {
        let mut cfg = config;

        let protocol = cfg.protocol.get_or_insert_with(|| HTTPS_PROTOCOL.to_string()).clone();
        if protocol != HTTPS_PROTOCOL && protocol != HTTP_PROTOCOL {
            return Err(ImperativeError::invalid_input_field(
                format!("Protocol must be {} or {}, got '{}'", HTTPS_PROTOCOL, HTTP_PROTOCOL, protocol),
                "protocol",
            ));
        }
        cfg.reject_unauthorized.get_or_insert(DEFAULT_REJECT_UNAUTHORIZED);
        cfg.port.get_or_insert(if protocol == HTTP_PROTOCOL {
            DEFAULT_HTTP_PORT
        } else {
            DEFAULT_HTTPS_PORT
        });
        cfg.base_path.get_or_insert_with(|| DEFAULT_BASE_PATH.to_string());
        let auth_type = *cfg.auth_type.get_or_insert(AuthType::None);

        if !cfg.has_prop("hostname") || cfg.hostname.as_deref().is_some_and(|h| h.trim().is_empty()) {
            return Err(ImperativeError::invalid_input_field(
                "Expected a non-blank value for 'hostname'",
                "hostname",
            ));
        }

        match auth_type {
            AuthType::Basic => {
                if !has_user_and_password(&cfg) && cfg.base64_encoded_auth.is_none() {
                    return Err(ImperativeError::session_with_details(
                        "Must have user & password OR base64 encoded credentials",
                        LOGIN_HINT,
                    ));
                }
                expect_undefined(&cfg, &["tokenType", "tokenValue", "cert", "certKey"], auth_type)?;
            }
            AuthType::Bearer => {
                expect_non_blank(&cfg, &["tokenValue"])?;
                expect_undefined(&cfg, &["tokenType", "user", "password", "cert", "certKey"], auth_type)?;
            }
            AuthType::Token => {
                if !cfg.has_prop("tokenType") {
                    return Err(ImperativeError::session(
                        "You must provide a token type to use cookie authentication",
                    ));
                }
                if cfg.token_value.is_none()
                    && !has_user_and_password(&cfg)
                    && cfg.base64_encoded_auth.is_none()
                {
                    return Err(ImperativeError::session_with_details(
                        "Must have user & password OR tokenType & tokenValue OR cert & certKey.",
                        LOGIN_HINT,
                    ));
                }
            }
            AuthType::CertPem => {
                expect_non_blank(&cfg, &["cert", "certKey"])?;
                expect_undefined(&cfg, &["tokenValue", "user", "password"], auth_type)?;
                if protocol == HTTP_PROTOCOL {
                    return Err(ImperativeError::session(
                        "Certificate based authentication cannot be used over HTTP. Please set protocol to HTTPS to use certificate authentication.",
                    ));
                }
            }
            AuthType::CertPfx => {
                return Err(ImperativeError::session(
                    "PFX certificate authentication is not supported",
                ));
            }
            AuthType::None => {}
        }

        if matches!(auth_type, AuthType::Basic | AuthType::Token) {
            match cfg.base64_encoded_auth.clone() {
                None => {
                    if let (Some(user), Some(password)) = (&cfg.user, &cfg.password) {
                        cfg.base64_encoded_auth = Some(get_base64_auth(user, password));
                    }
                }
                Some(auth) => {
                    if cfg.user.is_none() {
                        cfg.user = Some(get_username_from_auth(&auth)?);
                    }
                    if cfg.password.is_none() {
                        cfg.password = Some(get_password_from_auth(&auth)?);
                    }
                }
            }
        }

        Ok(Self { config: cfg })
    }

    /// The populated session config
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn into_config(self) -> SessionConfig {
        self.config
    }

    pub fn hostname(&self) -> &str {
        self.config.hostname.as_deref().unwrap_or_default()
    }

    pub fn port(&self) -> u16 {
        self.config.port.unwrap_or(DEFAULT_HTTPS_PORT)
    }

    pub fn protocol(&self) -> &str {
        self.config.protocol.as_deref().unwrap_or(HTTPS_PROTOCOL)
    }

    pub fn auth_type(&self) -> AuthType {
        self.config.auth_type.unwrap_or(AuthType::None)
    }

    pub fn base_path(&self) -> &str {
        self.config.base_path.as_deref().unwrap_or(DEFAULT_BASE_PATH)
    }

    pub fn reject_unauthorized(&self) -> bool {
        self.config.reject_unauthorized.unwrap_or(DEFAULT_REJECT_UNAUTHORIZED)
    }
}

fn has_user_and_password(cfg: &SessionConfig) -> bool {
    cfg.user.is_some() && cfg.password.is_some()
}

fn expect_non_blank(cfg: &SessionConfig, names: &[&str]) -> ImperativeResult<()> {
    for name in names {
        let blank = cfg
            .get_str(name)
            .is_none_or(|value| value.trim().is_empty());
        if blank {
            return Err(ImperativeError::invalid_input_field(
                format!("Expected a non-blank value for '{}'", name),
                *name,
            ));
        }
    }
    Ok(())
}

fn expect_undefined(cfg: &SessionConfig, names: &[&str], auth_type: AuthType) -> ImperativeResult<()> {
    match names.iter().find(|name| cfg.get_prop(name).is_some()) {
        Some(name) => Err(ImperativeError::invalid_input_field(
            format!("'{}' must not be set for {} authentication", name, auth_type),
            *name,
        )),
        None => Ok(()),
    }
}
