//! Auth order resolution
//!
//! Decides which authentication type a session uses. Every credential that
//! can be found in the session config or the command arguments is recorded
//! in the session's [`AuthCache`](super::config::AuthCache); the auth order
//! is then scanned and the first auth type whose credentials are all
//! available wins. Only the credentials of the winning type stay in the
//! session's top-level fields.

use super::args::CommandArguments;
use super::auth_type::AuthType;
use super::config::SessionConfig;
use super::secure_props::SecurePropRegistry;
use crate::config::vault::CredentialVault;
use crate::error::{ImperativeError, ImperativeResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Credential kinds tracked in the auth cache
pub const SESS_CRED_NAMES: [&str; 7] = [
    "user",
    "password",
    "base64EncodedAuth",
    "tokenType",
    "tokenValue",
    "cert",
    "certKey",
];

/// Argument carrying a user-supplied auth order
pub const AUTH_ORDER_ARG: &str = "authOrder";

const TEMP_CERT_PREFIX: &str = "zowe-cert-";

/// Where a property name is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropUse {
    /// Field of a session config
    SessCfg,
    /// Command argument
    CmdArgs,
    /// Config profile property
    Profile,
}

/// Translate a property name for the place it is used.
///
/// Session configs say `hostname`, `cert` and `certKey`; command arguments
/// and profiles say `host`, `certFile` and `certKeyFile`.
pub fn get_prop_nm_for(name: &str, usage: PropUse) -> String {
    let mapped = match usage {
        PropUse::SessCfg => match name {
            "host" => "hostname",
            "certFile" => "cert",
            "certKeyFile" => "certKey",
            other => other,
        },
        PropUse::CmdArgs | PropUse::Profile => match name {
            "hostname" => "host",
            "cert" => "certFile",
            "certKey" => "certKeyFile",
            other => other,
        },
    };
    mapped.to_string()
}

/// Auth types a cached credential kind belongs to
fn auth_types_for_cred(cred_name: &str) -> &'static [AuthType] {
    match cred_name {
        "user" | "password" | "base64EncodedAuth" => &[AuthType::Basic],
        "tokenType" => &[AuthType::Token],
        "tokenValue" => &[AuthType::Token, AuthType::Bearer],
        "cert" | "certKey" => &[AuthType::CertPem],
        _ => &[],
    }
}

fn censored(sess: &SessionConfig) -> String {
    SecurePropRegistry::new().censor(&sess.to_value()).to_string()
}

/// Record the auth order and every available credential in the auth cache
pub fn cache_creds_and_auth_order(sess: &mut SessionConfig, args: &CommandArguments) {
    cache_auth_order(sess, args);

    for cred_name in SESS_CRED_NAMES {
        cache_cred(sess, args, cred_name);
    }

    prune_creds_outside_order(sess);
}

/// Build a default auth order with `top` first.
///
/// Returns false, leaving the order untouched, when the user set the order.
pub fn cache_default_auth_order(sess: &mut SessionConfig, top: AuthType) -> bool {
    if sess.auth_cache.did_user_set_auth_order {
        info!(
            "Because user set authOrder, an attempt to put {} at the top of the order was ignored.",
            top
        );
        return false;
    }

    sess.auth_cache.top_default_auth = Some(top);
    sess.auth_type_order = if top == AuthType::Token {
        vec![AuthType::Token, AuthType::Basic]
    } else {
        vec![AuthType::Basic, AuthType::Token]
    };
    sess.auth_type_order.push(AuthType::Bearer);
    sess.auth_type_order.push(AuthType::CertPem);
    true
}

/// Forget every cached credential and the auth order bookkeeping
pub fn clear_auth_cache(sess: &mut SessionConfig) {
    sess.auth_cache = Default::default();
}

/// The session's auth order, creating a default one when it is empty
pub fn get_auth_order(sess: &mut SessionConfig) -> Vec<AuthType> {
    if sess.auth_type_order.is_empty() {
        sess.auth_cache.did_user_set_auth_order = false;
        choose_default_auth_order(sess);
    }
    sess.auth_type_order.clone()
}

/// Mark the session as being used to obtain a new token
pub fn making_request_for_token(sess: &mut SessionConfig) {
    // placeholder until a login mechanism is selected
    sess.auth_cache.auth_type_to_request_token = Some(AuthType::None);
}

/// Undo [`making_request_for_token`]
pub fn remove_request_for_token(sess: &mut SessionConfig) {
    sess.auth_cache.auth_type_to_request_token = None;
}

/// Whether a token is being requested with this session
pub fn is_requesting_token(sess: &SessionConfig) -> bool {
    sess.auth_cache.auth_type_to_request_token.is_some()
}

/// Force the session type to the top entry of the auth order
pub fn put_top_auth_in_session(sess: &mut SessionConfig) {
    if sess.auth_cache.available_creds.is_empty() {
        cache_creds_and_auth_order(sess, &CommandArguments::new());
    }
    let order = get_auth_order(sess);
    debug!("Starting sessCfg = {}", censored(sess));

    let requesting = is_requesting_token(sess);
    let top = order
        .iter()
        .copied()
        .filter(|auth| *auth != AuthType::CertPfx)
        .find(|auth| !(requesting && auth.is_token_based()))
        .unwrap_or(if requesting { AuthType::Basic } else { AuthType::None });

    place_creds_for(sess, top);
    let sess_type = match top {
        AuthType::Basic | AuthType::CertPem if requesting => {
            sess.auth_cache.auth_type_to_request_token = Some(top);
            AuthType::Token
        }
        other => other,
    };
    sess.auth_type = Some(sess_type);
    remove_extra_creds_from_sess(sess);
    debug!("Ending sessCfg = {}", censored(sess));
}

/// Merge the credentials available right now and select the session type
pub fn add_creds_to_session(sess: &mut SessionConfig, args: &CommandArguments) {
    cache_creds_and_auth_order(sess, args);
    debug!("Starting sessCfg = {}", censored(sess));

    let selected = select_auth_type(sess);
    sess.auth_type = Some(selected.unwrap_or(AuthType::None));
    remove_extra_creds_from_sess(sess);
    debug!("Ending sessCfg = {}", censored(sess));
}

/// Like [`add_creds_to_session`], after materializing deferred certificate
/// credentials from the vault.
///
/// A failed lookup propagates and leaves the session untouched.
pub async fn add_creds_to_session_async(
    sess: &mut SessionConfig,
    args: &CommandArguments,
    vault: Option<&dyn CredentialVault>,
) -> ImperativeResult<()> {
    if let Some(vault) = vault {
        let permits_cert = get_auth_order(sess).contains(&AuthType::CertPem);
        if permits_cert && !cert_is_available(sess, args) {
            materialize_cert_files(sess, vault).await?;
        }
    }
    add_creds_to_session(sess, args);
    Ok(())
}

/// Delete the temporary certificate files owned by the session
pub fn remove_temp_files(sess: &mut SessionConfig) {
    remove_temp_files_from(sess, 0);
}

/// Delete the temporary files recorded after the first `keep` entries
pub(crate) fn remove_temp_files_from(sess: &mut SessionConfig, keep: usize) {
    let keep = keep.min(sess.auth_cache.temp_files.len());
    for path in sess.auth_cache.temp_files.drain(keep..) {
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("Unable to delete temporary file {}: {}", path.display(), e);
        }
    }
}

fn cache_auth_order(sess: &mut SessionConfig, args: &CommandArguments) {
    if sess.auth_cache.did_user_set_auth_order {
        return;
    }

    if let Some(value) = args.get(AUTH_ORDER_ARG) {
        match value.as_str() {
            Some(text) if !text.is_empty() => {
                let mut user_order: Vec<AuthType> = Vec::new();
                for entry in text.split(',').map(str::trim) {
                    match entry.parse::<AuthType>() {
                        Ok(AuthType::CertPfx) => {
                            warn!("The authentication = '{}' is not supported and will be ignored.", entry);
                        }
                        Ok(auth) => {
                            if !user_order.contains(&auth) {
                                user_order.push(auth);
                            }
                        }
                        Err(_) => {
                            error!("The authentication = '{}' is not valid and will be ignored.", entry);
                        }
                    }
                }
                if !user_order.is_empty() {
                    sess.auth_type_order = user_order;
                    sess.auth_cache.did_user_set_auth_order = true;
                    return;
                }
            }
            Some(_) => {}
            None => {
                error!(
                    "The authOrder option = '{}' is not a valid authOrder string. A default authOrder will be used.",
                    value
                );
            }
        }
    }

    if !sess.auth_type_order.is_empty() && sess.auth_cache.top_default_auth.is_none() {
        // the caller supplied this order
        let mut caller_order: Vec<AuthType> = Vec::new();
        for auth in sess.auth_type_order.drain(..) {
            if auth == AuthType::CertPfx {
                warn!("The authentication = 'cert-pfx' is not supported and will be ignored.");
            } else if !caller_order.contains(&auth) {
                caller_order.push(auth);
            }
        }
        sess.auth_type_order = caller_order;
        sess.auth_cache.did_user_set_auth_order = true;
        return;
    }

    choose_default_auth_order(sess);
}

fn choose_default_auth_order(sess: &mut SessionConfig) {
    if sess.auth_cache.did_user_set_auth_order {
        return;
    }
    let top = sess.auth_cache.top_default_auth.unwrap_or(AuthType::Basic);
    cache_default_auth_order(sess, top);
}

fn cache_cred(sess: &mut SessionConfig, args: &CommandArguments, cred_name: &str) {
    if let Some(value) = sess.get_str(cred_name).filter(|v| !v.is_empty()) {
        sess.auth_cache.available_creds.insert(cred_name.to_string(), value);
        return;
    }

    // cert-related properties have different names in command args
    let arg_names = match cred_name {
        "cert" => vec!["certFile", "cert"],
        "certKey" => vec!["certKeyFile", "certKey"],
        other => vec![other],
    };
    if let Some(value) = arg_names
        .iter()
        .find_map(|name| args.get_str(name).filter(|v| !v.is_empty()))
    {
        sess.auth_cache.available_creds.insert(cred_name.to_string(), value);
    }
}

fn prune_creds_outside_order(sess: &mut SessionConfig) {
    let requesting = is_requesting_token(sess);
    let order = sess.auth_type_order.clone();
    sess.auth_cache.available_creds.retain(|cred_name, _| {
        let owners = auth_types_for_cred(cred_name);
        let login_cred = owners.contains(&AuthType::Basic) || owners.contains(&AuthType::CertPem);
        owners.iter().any(|auth| order.contains(auth)) || (requesting && login_cred)
    });
}

fn cached(sess: &SessionConfig, cred_name: &str) -> Option<String> {
    sess.auth_cache
        .available_creds
        .get(cred_name)
        .filter(|v| !v.is_empty())
        .cloned()
}

fn cert_is_available(sess: &SessionConfig, args: &CommandArguments) -> bool {
    let in_cache = cached(sess, "cert").is_some() && cached(sess, "certKey").is_some();
    let in_sess = sess.has_prop("cert") && sess.has_prop("certKey");
    let in_args = (args.has_value("certFile") || args.has_value("cert"))
        && (args.has_value("certKeyFile") || args.has_value("certKey"));
    in_cache || in_sess || in_args
}

/// Copy the cached credentials of one auth type into the session.
/// Returns whether all of that type's credentials were available.
fn place_creds_for(sess: &mut SessionConfig, auth: AuthType) -> bool {
    match auth {
        AuthType::Basic => {
            if let (Some(user), Some(password)) = (cached(sess, "user"), cached(sess, "password")) {
                // always regenerate in case it is out of date with user & password
                let b64 = STANDARD.encode(format!("{}:{}", user, password));
                sess.auth_cache
                    .available_creds
                    .insert("base64EncodedAuth".to_string(), b64.clone());
                sess.user = Some(user);
                sess.password = Some(password);
                sess.base64_encoded_auth = Some(b64);
                true
            } else if let Some(b64) = cached(sess, "base64EncodedAuth") {
                sess.base64_encoded_auth = Some(b64);
                true
            } else {
                false
            }
        }
        AuthType::Token | AuthType::Bearer => {
            if let Some(token_type) = cached(sess, "tokenType") {
                sess.token_type = Some(token_type);
            }
            if let Some(token_value) = cached(sess, "tokenValue") {
                sess.token_value = Some(token_value);
            }
            let has_type = sess.has_prop("tokenType");
            let has_value = sess.has_prop("tokenValue");
            if auth == AuthType::Token {
                has_type && has_value
            } else {
                !has_type && has_value
            }
        }
        AuthType::CertPem => {
            if let (Some(cert), Some(cert_key)) = (cached(sess, "cert"), cached(sess, "certKey")) {
                sess.cert = Some(cert);
                sess.cert_key = Some(cert_key);
                true
            } else {
                false
            }
        }
        AuthType::None => true,
        AuthType::CertPfx => false,
    }
}

fn select_auth_type(sess: &mut SessionConfig) -> Option<AuthType> {
    let requesting = is_requesting_token(sess);
    let order = sess.auth_type_order.clone();

    for auth in order {
        if auth == AuthType::CertPfx {
            warn!("The authentication = 'cert-pfx' is not supported and will be ignored.");
            continue;
        }
        if requesting && auth.is_token_based() {
            // a token cannot be used to obtain a new token
            continue;
        }
        if place_creds_for(sess, auth) {
            return Some(login_or(sess, auth));
        }
    }

    if requesting {
        for auth in [AuthType::Basic, AuthType::CertPem] {
            if place_creds_for(sess, auth) {
                return Some(login_or(sess, auth));
            }
        }
    }
    None
}

/// When requesting a token, record `auth` as the login mechanism and report token
fn login_or(sess: &mut SessionConfig, auth: AuthType) -> AuthType {
    if is_requesting_token(sess) && matches!(auth, AuthType::Basic | AuthType::CertPem) {
        sess.auth_cache.auth_type_to_request_token = Some(auth);
        AuthType::Token
    } else {
        auth
    }
}

fn remove_extra_creds_from_sess(sess: &mut SessionConfig) {
    let Some(sess_type) = sess.auth_type else {
        return;
    };

    let keep: &[&str] = match sess_type {
        AuthType::Basic if sess.has_prop("base64EncodedAuth") => {
            &["base64EncodedAuth", "user", "password"]
        }
        AuthType::Token => match sess.auth_cache.auth_type_to_request_token {
            None | Some(AuthType::None) => &["tokenType", "tokenValue"],
            Some(AuthType::CertPem) => &["tokenType", "cert", "certKey"],
            Some(_) => &["tokenType", "base64EncodedAuth", "user", "password"],
        },
        AuthType::Bearer => &["tokenValue"],
        AuthType::CertPem => &["cert", "certKey"],
        _ => &[],
    };

    for cred_name in SESS_CRED_NAMES {
        if !keep.contains(&cred_name) {
            sess.clear_prop(cred_name);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CertPart {
    Cert,
    Key,
}

async fn load_from_first_account(
    vault: &dyn CredentialVault,
    candidates: &[Option<String>],
    part: CertPart,
) -> ImperativeResult<Option<Vec<u8>>> {
    for account in candidates.iter().flatten() {
        let bytes = match part {
            CertPart::Cert => vault.load_certificate(account).await?,
            CertPart::Key => vault.load_certificate_key(account).await?,
        };
        if bytes.is_some() {
            debug!("Found {:?} material for account {}", part, account);
            return Ok(bytes);
        }
    }
    Ok(None)
}

async fn materialize_cert_files(
    sess: &mut SessionConfig,
    vault: &dyn CredentialVault,
) -> ImperativeResult<()> {
    let cert_account = match &sess.cert_account {
        Some(source) => Some(source.resolve().await?),
        None => None,
    };
    let cert_key_account = match &sess.cert_key_account {
        Some(source) => Some(source.resolve().await?),
        None => None,
    };

    let cert_candidates = [cert_account, sess.profile.clone(), sess.account.clone()];
    let key_candidates = [cert_key_account, sess.profile.clone(), sess.account.clone()];

    let Some(cert_bytes) = load_from_first_account(vault, &cert_candidates, CertPart::Cert).await?
    else {
        return Ok(());
    };
    let Some(key_bytes) = load_from_first_account(vault, &key_candidates, CertPart::Key).await?
    else {
        return Ok(());
    };

    let cert_path = write_temp_file(&cert_bytes)?;
    let key_path = match write_temp_file(&key_bytes) {
        Ok(path) => path,
        Err(e) => {
            let _ = std::fs::remove_file(&cert_path);
            return Err(e);
        }
    };

    sess.cert = Some(cert_path.to_string_lossy().into_owned());
    sess.cert_key = Some(key_path.to_string_lossy().into_owned());
    sess.auth_cache.temp_files.push(cert_path);
    sess.auth_cache.temp_files.push(key_path);
    Ok(())
}

fn write_temp_file(bytes: &[u8]) -> ImperativeResult<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix(TEMP_CERT_PREFIX)
        .suffix(".pem")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    let (_, path) = file.keep().map_err(|e| ImperativeError::from(e.error))?;
    Ok(path)
}

#[cfg(test)]
mod tests;
