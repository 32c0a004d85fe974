//! Authentication types and token type constants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// JSON web token, the default token type
pub const TOKEN_TYPE_JWT: &str = "jwtToken";

/// LTPA2 token issued by z/OSMF
pub const TOKEN_TYPE_LTPA: &str = "LtpaToken2";

/// Token issued by the API Mediation Layer
pub const TOKEN_TYPE_APIML: &str = "apimlAuthenticationToken";

/// Known token types
pub const TOKEN_TYPE_CHOICES: [&str; 3] = [TOKEN_TYPE_JWT, TOKEN_TYPE_LTPA, TOKEN_TYPE_APIML];

/// Protocol used when none is configured
pub const HTTPS_PROTOCOL: &str = "https";

/// Plain HTTP protocol
pub const HTTP_PROTOCOL: &str = "http";

/// Type of authentication a session uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuthType {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "basic")]
    Basic,
    #[serde(rename = "token")]
    Token,
    #[serde(rename = "bearer")]
    Bearer,
    #[serde(rename = "cert-pem")]
    CertPem,
    /// Reserved. Never selected by the resolver.
    #[serde(rename = "cert-pfx")]
    CertPfx,
}

impl AuthType {
    /// Identifier used in config files and the `--auth-order` option
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::None => "none",
            AuthType::Basic => "basic",
            AuthType::Token => "token",
            AuthType::Bearer => "bearer",
            AuthType::CertPem => "cert-pem",
            AuthType::CertPfx => "cert-pfx",
        }
    }

    /// Session properties this auth type needs, in prompting order
    pub fn required_props(&self) -> &'static [&'static str] {
        match self {
            AuthType::None => &[],
            AuthType::Basic => &["user", "password"],
            AuthType::Token => &["tokenType", "tokenValue"],
            AuthType::Bearer => &["tokenValue"],
            AuthType::CertPem => &["cert", "certKey"],
            AuthType::CertPfx => &["cert", "passphrase"],
        }
    }

    /// Auth types that carry a token
    pub fn is_token_based(&self) -> bool {
        matches!(self, AuthType::Token | AuthType::Bearer)
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(AuthType::None),
            "basic" => Ok(AuthType::Basic),
            "token" => Ok(AuthType::Token),
            "bearer" => Ok(AuthType::Bearer),
            "cert-pem" => Ok(AuthType::CertPem),
            "cert-pfx" => Ok(AuthType::CertPfx),
            _ => Err(format!("Unknown authentication type: {}", s)),
        }
    }
}
