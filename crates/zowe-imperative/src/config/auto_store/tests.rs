use super::*;
use crate::config::store::SECURE_CONFIG_KEY;
use crate::config::vault::{CredentialVault, MemoryVault, load_json};
use crate::prompt::MockPrompter;
use crate::settings::ImperativeSettings;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Fixture {
    _home: TempDir,
    project: TempDir,
    vault: Arc<MemoryVault>,
    imperative: Arc<ImperativeConfig>,
}

impl Fixture {
    async fn new(doc: Value) -> Self {
        Self::with_handler(doc, None).await
    }

    async fn with_handler(doc: Value, handler: Option<(&str, Arc<dyn AuthHandler>)>) -> Self {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            project.path().join("zowe.config.json"),
            serde_json::to_string_pretty(&doc).unwrap(),
        )
        .unwrap();

        let vault = Arc::new(MemoryVault::new());
        let settings = ImperativeSettings::default().with_cli_home(home.path());
        let mut imperative = ImperativeConfig::load(
            settings,
            project.path(),
            Some(vault.clone() as Arc<dyn CredentialVault>),
        )
        .await
        .unwrap();
        if let Some((profile_type, handler)) = handler {
            imperative = imperative.with_auth_handler(profile_type, handler);
        }

        Self {
            _home: home,
            project,
            vault,
            imperative: Arc::new(imperative),
        }
    }

    fn store(&self) -> ConfigAutoStore {
        ConfigAutoStore::new(self.imperative.clone())
    }

    fn layer_path(&self) -> PathBuf {
        self.project.path().join("zowe.config.json")
    }

    fn written(&self) -> Value {
        serde_json::from_str(&fs::read_to_string(self.layer_path()).unwrap()).unwrap()
    }

    async fn secure_values(&self) -> Value {
        let all = load_json(&*self.vault, SECURE_CONFIG_KEY)
            .await
            .unwrap()
            .unwrap_or(Value::Null);
        all[self.layer_path().display().to_string()].clone()
    }
}

fn zosmf_params() -> HandlerContext {
    HandlerContext::default().with_required_profile("zosmf")
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_no_props_is_noop() {
    let fx = Fixture::new(json!({"profiles": {"zosmf": {"type": "zosmf"}}})).await;
    let before = fs::read_to_string(fx.layer_path()).unwrap();
    let mut sess = SessionConfig::new().with_hostname("bar");
    fx.store()
        .store_sess_cfg_props(&zosmf_params(), &mut sess, &[])
        .await
        .unwrap();
    assert_eq!(fs::read_to_string(fx.layer_path()).unwrap(), before);
}

#[tokio::test]
async fn test_without_config_is_noop() {
    let store = ConfigAutoStore::new(Arc::new(ImperativeConfig::new(ImperativeSettings::default())));
    let mut sess = SessionConfig::new().with_hostname("bar");
    store
        .store_sess_cfg_props(&zosmf_params(), &mut sess, &names(&["hostname"]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_auto_store_disabled() {
    let fx = Fixture::new(json!({
        "profiles": {"zosmf": {"type": "zosmf", "properties": {"port": 443}}},
        "defaults": {"zosmf": "zosmf"},
        "autoStore": false
    }))
    .await;
    let before = fs::read_to_string(fx.layer_path()).unwrap();
    let mut sess = SessionConfig::new().with_hostname("bar");
    fx.store()
        .store_sess_cfg_props(&zosmf_params(), &mut sess, &names(&["hostname"]))
        .await
        .unwrap();
    assert_eq!(fs::read_to_string(fx.layer_path()).unwrap(), before);
}

#[tokio::test]
async fn test_hostname_stored_as_host_in_service_profile() {
    let fx = Fixture::new(json!({
        "profiles": {"zosmf": {"type": "zosmf", "properties": {"port": 443}}},
        "defaults": {"zosmf": "zosmf"}
    }))
    .await;
    let mut sess = SessionConfig::new().with_hostname("bar");
    fx.store()
        .store_sess_cfg_props(&zosmf_params(), &mut sess, &names(&["hostname"]))
        .await
        .unwrap();

    let written = fx.written();
    assert_eq!(written["profiles"]["zosmf"]["properties"]["host"], json!("bar"));
    assert_eq!(written["profiles"]["zosmf"]["properties"]["port"], json!(443));
}

#[tokio::test]
async fn test_property_goes_to_base_when_only_base_has_it() {
    let fx = Fixture::new(json!({
        "profiles": {
            "zosmf": {"type": "zosmf", "properties": {"port": 443}},
            "base": {"type": "base", "properties": {"host": "old"}}
        },
        "defaults": {"zosmf": "zosmf", "base": "base"}
    }))
    .await;
    let mut sess = SessionConfig::new().with_hostname("bar");
    fx.store()
        .store_sess_cfg_props(&zosmf_params(), &mut sess, &names(&["hostname"]))
        .await
        .unwrap();

    let written = fx.written();
    assert_eq!(written["profiles"]["base"]["properties"]["host"], json!("bar"));
    assert!(written["profiles"]["zosmf"]["properties"].get("host").is_none());
}

#[tokio::test]
async fn test_secure_props_go_to_vault() {
    let fx = Fixture::new(json!({
        "profiles": {
            "zosmf": {"type": "zosmf", "properties": {"port": 443}},
            "base": {"type": "base", "secure": ["user", "password"]}
        },
        "defaults": {"zosmf": "zosmf", "base": "base"}
    }))
    .await;
    let mut sess = SessionConfig::new().with_basic_creds("alice", "pw1");
    fx.store()
        .store_sess_cfg_props(&zosmf_params(), &mut sess, &names(&["user", "password"]))
        .await
        .unwrap();

    let text = fs::read_to_string(fx.layer_path()).unwrap();
    assert!(!text.contains("alice"));
    assert!(!text.contains("pw1"));

    let secure = fx.secure_values().await;
    assert_eq!(secure["profiles.base.properties.user"], json!("alice"));
    assert_eq!(secure["profiles.base.properties.password"], json!("pw1"));
    assert_eq!(sess.user.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_secure_prop_stored_where_secure_array_lists_it() {
    let fx = Fixture::new(json!({
        "profiles": {
            "lpar1": {
                "secure": ["password"],
                "profiles": {"zosmf": {"type": "zosmf", "properties": {"port": 443}}}
            }
        },
        "defaults": {"zosmf": "lpar1.zosmf"}
    }))
    .await;
    let mut sess = SessionConfig::new().with_basic_creds("alice", "pw1");
    fx.store()
        .store_sess_cfg_props(&zosmf_params(), &mut sess, &names(&["password"]))
        .await
        .unwrap();

    let secure = fx.secure_values().await;
    assert_eq!(secure["profiles.lpar1.properties.password"], json!("pw1"));
    assert!(secure.get("profiles.lpar1.profiles.zosmf.properties.password").is_none());
}

#[tokio::test]
async fn test_token_fetched_instead_of_user_and_password() {
    let mut handler = MockAuthHandler::new();
    handler
        .expect_default_token_type()
        .returning(|| "apimlAuthenticationToken".to_string());
    handler.expect_session_login().times(1).returning(|session| {
        assert_eq!(session.config().user.as_deref(), Some("alice"));
        assert_eq!(session.auth_type(), AuthType::Token);
        Ok("tok123".to_string())
    });
    let handler: Arc<dyn AuthHandler> = Arc::new(handler);

    let fx = Fixture::with_handler(
        json!({
            "profiles": {
                "zosmf": {
                    "type": "zosmf",
                    "properties": {"port": 443, "basePath": "/api/v1", "tokenType": "apimlAuthenticationToken"},
                    "secure": ["tokenValue"]
                }
            },
            "defaults": {"zosmf": "zosmf"}
        }),
        Some(("zosmf", handler)),
    )
    .await;

    let mut sess = SessionConfig::new()
        .with_hostname("h")
        .with_basic_creds("alice", "pw1");
    fx.store()
        .store_sess_cfg_props(&zosmf_params(), &mut sess, &names(&["user", "password"]))
        .await
        .unwrap();

    assert_eq!(sess.token_value.as_deref(), Some("tok123"));
    assert_eq!(sess.token_type.as_deref(), Some("apimlAuthenticationToken"));
    assert_eq!(sess.auth_type, Some(AuthType::Token));
    assert!(sess.user.is_none());
    assert!(sess.password.is_none());

    let secure = fx.secure_values().await;
    assert_eq!(secure["profiles.zosmf.properties.tokenValue"], json!("tok123"));
    assert!(secure.get("profiles.zosmf.properties.user").is_none());
}

#[tokio::test]
async fn test_no_token_fetch_without_base_path() {
    let mut handler = MockAuthHandler::new();
    handler.expect_session_login().never();
    let handler: Arc<dyn AuthHandler> = Arc::new(handler);

    let fx = Fixture::with_handler(
        json!({
            "profiles": {"zosmf": {"type": "zosmf", "properties": {"tokenType": "jwtToken"}, "secure": ["user", "password"]}},
            "defaults": {"zosmf": "zosmf"}
        }),
        Some(("zosmf", handler)),
    )
    .await;
    let mut sess = SessionConfig::new().with_basic_creds("alice", "pw1");
    fx.store()
        .store_sess_cfg_props(&zosmf_params(), &mut sess, &names(&["user", "password"]))
        .await
        .unwrap();
    assert_eq!(fx.secure_values().await["profiles.zosmf.properties.user"], json!("alice"));
}

#[tokio::test]
async fn test_message_shown_on_console() {
    let fx = Fixture::new(json!({
        "profiles": {"zosmf": {"type": "zosmf", "properties": {"port": 443}}},
        "defaults": {"zosmf": "zosmf"}
    }))
    .await;
    let mut console = MockPrompter::new();
    console
        .expect_show_message()
        .withf(|message| message.starts_with("Stored properties in ") && message.ends_with(": host"))
        .times(1)
        .return_const(());

    let params = zosmf_params().with_console(Arc::new(console));
    let mut sess = SessionConfig::new().with_hostname("bar");
    fx.store()
        .store_sess_cfg_props(&params, &mut sess, &names(&["hostname"]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_layer_holding_profile_is_written_and_active_layer_restored() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("zowe.config.json"), "{}").unwrap();
    fs::write(
        home.path().join("zowe.config.json"),
        json!({
            "profiles": {"zosmf": {"type": "zosmf", "properties": {"port": 443}}},
            "defaults": {"zosmf": "zosmf"}
        })
        .to_string(),
    )
    .unwrap();

    let settings = ImperativeSettings::default().with_cli_home(home.path());
    let imperative = Arc::new(ImperativeConfig::load(settings, project.path(), None).await.unwrap());
    let store = ConfigAutoStore::new(imperative.clone());
    let mut sess = SessionConfig::new().with_hostname("bar");
    store
        .store_sess_cfg_props(&zosmf_params(), &mut sess, &names(&["hostname"]))
        .await
        .unwrap();

    let global: Value =
        serde_json::from_str(&fs::read_to_string(home.path().join("zowe.config.json")).unwrap()).unwrap();
    assert_eq!(global["profiles"]["zosmf"]["properties"]["host"], json!("bar"));

    let config = imperative.config().unwrap().read().await;
    assert!(!config.active_layer().global);
    assert!(!config.active_layer().user);
}

#[tokio::test]
async fn test_find_active_profile() {
    let fx = Fixture::new(json!({"defaults": {"ssh": "my_ssh"}})).await;
    let params = HandlerContext::default()
        .with_required_profile("zosmf")
        .with_optional_profile("ssh");
    let store = fx.store();

    assert_eq!(
        store.find_active_profile(&params, &names(&["host", "port"])).await,
        Some(("zosmf".to_string(), "zosmf".to_string()))
    );
    assert_eq!(
        store.find_active_profile(&params, &names(&["privateKey"])).await,
        Some(("ssh".to_string(), "my_ssh".to_string()))
    );
    assert_eq!(store.find_active_profile(&params, &names(&["nope"])).await, None);
}
