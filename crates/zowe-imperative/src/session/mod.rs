//! Session configuration and credential resolution
//!
//! A [`SessionConfig`] starts out partial. [`ConnectionPropsForSessCfg`]
//! fills in what is missing from command arguments, team config, a values
//! provider or the user, and the auth order resolver in [`auth_order`]
//! decides which credentials the session carries. [`Session`] validates the
//! result and applies defaults.

pub mod args;
pub mod auth_order;
pub mod auth_type;
pub mod builder;
pub mod config;
pub mod conn_props;
pub mod options;
pub mod secure_props;

pub use args::{CommandArguments, has_value};
pub use auth_order::{PropUse, get_prop_nm_for};
pub use auth_type::{
    AuthType, HTTP_PROTOCOL, HTTPS_PROTOCOL, TOKEN_TYPE_APIML, TOKEN_TYPE_CHOICES, TOKEN_TYPE_JWT,
    TOKEN_TYPE_LTPA,
};
pub use builder::{Session, get_base64_auth, get_password_from_auth, get_username_from_auth};
pub use config::{AuthCache, CredentialSource, SessionConfig};
pub use conn_props::{ConnectionPropsForSessCfg, Overridden, apply_overrides, sess_has_creds};
pub use options::{ConnectionOptions, PromptProp, PropertyOverride, ValuesProvider};
pub use secure_props::SecurePropRegistry;
