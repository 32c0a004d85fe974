//! Tests for auth order resolution

use super::*;
use crate::config::vault::{MemoryVault, MockCredentialVault};
use crate::session::config::CredentialSource;

fn basic_and_token_args() -> CommandArguments {
    CommandArguments::new()
        .with("user", "alice")
        .with("password", "pw1")
        .with("tokenType", "jwtToken")
        .with("tokenValue", "tok123")
}

#[test]
fn test_default_order_is_basic_first() {
    let mut sess = SessionConfig::new();
    cache_creds_and_auth_order(&mut sess, &CommandArguments::new());

    assert_eq!(
        sess.auth_type_order,
        vec![AuthType::Basic, AuthType::Token, AuthType::Bearer, AuthType::CertPem]
    );
    assert!(!sess.auth_cache.did_user_set_auth_order);
}

#[test]
fn test_default_order_token_first() {
    let mut sess = SessionConfig::new();
    assert!(cache_default_auth_order(&mut sess, AuthType::Token));
    assert_eq!(sess.auth_type_order[0], AuthType::Token);
    assert!(!sess.auth_type_order.contains(&AuthType::None));
}

#[test]
fn test_user_auth_order_is_parsed_trimmed_and_deduped() {
    let mut sess = SessionConfig::new();
    let args = CommandArguments::new().with("authOrder", " token, bogus ,basic,token ");
    cache_creds_and_auth_order(&mut sess, &args);

    assert_eq!(sess.auth_type_order, vec![AuthType::Token, AuthType::Basic]);
    assert!(sess.auth_cache.did_user_set_auth_order);
}

#[test]
fn test_all_invalid_auth_order_falls_back_to_default() {
    let mut sess = SessionConfig::new();
    let args = CommandArguments::new().with("authOrder", "kerberos");
    cache_creds_and_auth_order(&mut sess, &args);

    assert_eq!(sess.auth_type_order[0], AuthType::Basic);
    assert!(!sess.auth_cache.did_user_set_auth_order);
}

#[test]
fn test_user_order_is_sticky() {
    let mut sess = SessionConfig::new();
    let args = CommandArguments::new().with("authOrder", "cert-pem,basic");
    cache_creds_and_auth_order(&mut sess, &args);

    assert!(!cache_default_auth_order(&mut sess, AuthType::Token));
    cache_creds_and_auth_order(&mut sess, &CommandArguments::new().with("authOrder", "token"));
    assert_eq!(sess.auth_type_order, vec![AuthType::CertPem, AuthType::Basic]);
}

#[test]
fn test_first_match_token_before_basic() {
    let mut sess = SessionConfig::new().with_auth_type_order(vec![AuthType::Token, AuthType::Basic]);
    add_creds_to_session(&mut sess, &basic_and_token_args());

    assert_eq!(sess.auth_type, Some(AuthType::Token));
    assert_eq!(sess.token_value.as_deref(), Some("tok123"));
    assert!(sess.user.is_none());
    assert!(sess.password.is_none());
}

#[test]
fn test_first_match_basic_before_token() {
    let mut sess = SessionConfig::new().with_auth_type_order(vec![AuthType::Basic, AuthType::Token]);
    add_creds_to_session(&mut sess, &basic_and_token_args());

    assert_eq!(sess.auth_type, Some(AuthType::Basic));
    assert_eq!(sess.user.as_deref(), Some("alice"));
    assert_eq!(sess.base64_encoded_auth.as_deref(), Some("YWxpY2U6cHcx"));
    assert!(sess.token_value.is_none());
    assert!(sess.token_type.is_none());
}

#[test]
fn test_session_value_wins_over_argument() {
    let mut sess = SessionConfig::new().with_basic_creds("bob", "secret");
    add_creds_to_session(&mut sess, &basic_and_token_args());

    assert_eq!(sess.auth_cache.available_creds["user"], "bob");
    assert_eq!(sess.user.as_deref(), Some("bob"));
}

#[test]
fn test_bearer_needs_no_token_type() {
    let mut sess = SessionConfig::new();
    add_creds_to_session(&mut sess, &CommandArguments::new().with("tokenValue", "tok"));
    assert_eq!(sess.auth_type, Some(AuthType::Bearer));
}

#[test]
fn test_cert_args_use_file_names() {
    let mut sess = SessionConfig::new();
    let args = CommandArguments::new()
        .with("certFile", "/certs/me.pem")
        .with("certKeyFile", "/certs/me.key");
    add_creds_to_session(&mut sess, &args);

    assert_eq!(sess.auth_type, Some(AuthType::CertPem));
    assert_eq!(sess.cert.as_deref(), Some("/certs/me.pem"));
    assert_eq!(sess.cert_key.as_deref(), Some("/certs/me.key"));
}

#[test]
fn test_no_creds_gives_none() {
    let mut sess = SessionConfig::new().with_hostname("lpar1");
    add_creds_to_session(&mut sess, &CommandArguments::new().with("user", "alice"));

    assert_eq!(sess.auth_type, Some(AuthType::None));
    // the partial credential stays cached but leaves the session
    assert!(sess.user.is_none());
    assert_eq!(sess.auth_cache.available_creds["user"], "alice");
}

#[test]
fn test_none_in_order_always_matches() {
    let mut sess = SessionConfig::new();
    let args = CommandArguments::new().with("authOrder", "none,basic");
    add_creds_to_session(&mut sess, &args.with("user", "a").with("password", "b"));
    assert_eq!(sess.auth_type, Some(AuthType::None));
}

#[test]
fn test_creds_outside_order_are_pruned() {
    let mut sess = SessionConfig::new();
    let args = basic_and_token_args().with("authOrder", "basic");
    add_creds_to_session(&mut sess, &args);

    let creds = &sess.auth_cache.available_creds;
    assert!(creds.contains_key("user"));
    assert!(!creds.contains_key("tokenValue"));
    assert!(!creds.contains_key("tokenType"));
}

#[test]
fn test_request_token_uses_basic_login() {
    let mut sess = SessionConfig::new();
    making_request_for_token(&mut sess);
    add_creds_to_session(&mut sess, &basic_and_token_args());

    assert_eq!(sess.auth_type, Some(AuthType::Token));
    assert_eq!(sess.auth_cache.auth_type_to_request_token, Some(AuthType::Basic));
    assert_eq!(sess.user.as_deref(), Some("alice"));
    assert!(sess.token_value.is_none());

    remove_request_for_token(&mut sess);
    assert!(!is_requesting_token(&sess));
}

#[test]
fn test_request_token_keeps_login_creds_outside_order() {
    let mut sess = SessionConfig::new();
    making_request_for_token(&mut sess);
    let args = basic_and_token_args().with("authOrder", "token");
    add_creds_to_session(&mut sess, &args);

    assert_eq!(sess.auth_type, Some(AuthType::Token));
    assert_eq!(sess.auth_cache.auth_type_to_request_token, Some(AuthType::Basic));
}

#[test]
fn test_put_top_auth_in_session() {
    let mut sess = SessionConfig::new();
    add_creds_to_session(&mut sess, &basic_and_token_args());
    assert_eq!(sess.auth_type, Some(AuthType::Basic));

    sess.auth_type_order = vec![AuthType::Token];
    sess.auth_cache.did_user_set_auth_order = true;
    put_top_auth_in_session(&mut sess);

    assert_eq!(sess.auth_type, Some(AuthType::Token));
    assert_eq!(sess.token_value.as_deref(), Some("tok123"));
    assert!(sess.user.is_none());
}

#[test]
fn test_clear_auth_cache() {
    let mut sess = SessionConfig::new();
    add_creds_to_session(&mut sess, &basic_and_token_args());
    clear_auth_cache(&mut sess);
    assert!(sess.auth_cache.available_creds.is_empty());
    assert!(!sess.auth_cache.did_user_set_auth_order);
}

#[test]
fn test_get_prop_nm_for() {
    assert_eq!(get_prop_nm_for("hostname", PropUse::Profile), "host");
    assert_eq!(get_prop_nm_for("host", PropUse::SessCfg), "hostname");
    assert_eq!(get_prop_nm_for("certKey", PropUse::CmdArgs), "certKeyFile");
    assert_eq!(get_prop_nm_for("certFile", PropUse::SessCfg), "cert");
    assert_eq!(get_prop_nm_for("port", PropUse::Profile), "port");
}

#[tokio::test]
async fn test_async_merge_is_idempotent() {
    let mut sess = SessionConfig::new();
    let args = basic_and_token_args();

    add_creds_to_session_async(&mut sess, &args, None).await.unwrap();
    let first_creds = sess.auth_cache.available_creds.clone();
    let first_type = sess.auth_type;

    add_creds_to_session_async(&mut sess, &args, None).await.unwrap();
    assert_eq!(sess.auth_cache.available_creds, first_creds);
    assert_eq!(sess.auth_type, first_type);
}

#[tokio::test]
async fn test_async_merge_materializes_certificates() {
    let vault = MemoryVault::new()
        .with_entry("acct/cert", "CERT PEM")
        .with_entry("acct/certKey", "KEY PEM");
    let mut sess = SessionConfig::new().with_cert_accounts(
        CredentialSource::deferred(|| async { Ok("acct".to_string()) }),
        CredentialSource::literal("acct"),
    );

    add_creds_to_session_async(&mut sess, &CommandArguments::new(), Some(&vault))
        .await
        .unwrap();

    assert_eq!(sess.auth_type, Some(AuthType::CertPem));
    assert_eq!(sess.auth_cache.temp_files.len(), 2);
    let cert_path = sess.cert.clone().unwrap();
    assert_eq!(std::fs::read_to_string(&cert_path).unwrap(), "CERT PEM");
    assert!(
        std::path::Path::new(&cert_path)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("zowe-cert-")
    );

    // a second merge reuses the files it already wrote
    add_creds_to_session_async(&mut sess, &CommandArguments::new(), Some(&vault))
        .await
        .unwrap();
    assert_eq!(sess.auth_cache.temp_files.len(), 2);

    let paths = sess.auth_cache.temp_files.clone();
    remove_temp_files(&mut sess);
    assert!(sess.auth_cache.temp_files.is_empty());
    assert!(paths.iter().all(|p| !p.exists()));
}

#[tokio::test]
async fn test_async_merge_falls_back_to_profile_account() {
    let vault = MemoryVault::new()
        .with_entry("lpar1.zosmf/cert", "CERT")
        .with_entry("lpar1.zosmf/certKey", "KEY");
    let mut sess = SessionConfig::new();
    sess.profile = Some("lpar1.zosmf".to_string());

    add_creds_to_session_async(&mut sess, &CommandArguments::new(), Some(&vault))
        .await
        .unwrap();
    assert_eq!(sess.auth_type, Some(AuthType::CertPem));
    remove_temp_files(&mut sess);
}

#[tokio::test]
async fn test_async_lookup_failure_propagates() {
    let mut vault = MockCredentialVault::new();
    vault
        .expect_load_certificate()
        .returning(|_| Err(ImperativeError::credential("vault locked")));
    vault.expect_load_certificate_key().never();

    let mut sess = SessionConfig::new().with_hostname("lpar1");
    sess.account = Some("acct".to_string());

    let err = add_creds_to_session_async(&mut sess, &CommandArguments::new(), Some(&vault))
        .await
        .unwrap_err();
    assert!(matches!(err, ImperativeError::Credential { .. }));
    assert!(sess.auth_cache.available_creds.is_empty());
    assert!(sess.cert.is_none());
}

#[tokio::test]
async fn test_no_vault_lookup_when_cert_given() {
    let mut vault = MockCredentialVault::new();
    vault.expect_load_certificate().never();

    let mut sess = SessionConfig::new();
    sess.account = Some("acct".to_string());
    let args = CommandArguments::new()
        .with("certFile", "/c.pem")
        .with("certKeyFile", "/k.pem");

    add_creds_to_session_async(&mut sess, &args, Some(&vault)).await.unwrap();
    assert_eq!(sess.auth_type, Some(AuthType::CertPem));
}

#[test]
fn test_remove_temp_files_from_keeps_earlier_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let kept = dir.path().join("caller.pem");
    let created = dir.path().join("created.pem");
    std::fs::write(&kept, "a").unwrap();
    std::fs::write(&created, "b").unwrap();

    let mut sess = SessionConfig::new();
    sess.auth_cache.temp_files = vec![kept.clone(), created.clone()];
    remove_temp_files_from(&mut sess, 1);

    assert_eq!(sess.auth_cache.temp_files, vec![kept.clone()]);
    assert!(kept.exists());
    assert!(!created.exists());
}
