//! Session resolution commands

use super::{open_vault, working_dir};
use crate::args::ConnectionArgs;
use crate::console::CliConsole;
use serde_json::Value;
use std::sync::Arc;
use zowe_imperative::config::ImperativeConfig;
use zowe_imperative::error::ImperativeResult;
use zowe_imperative::prompt::{HandlerContext, Prompter, TerminalPrompter};
use zowe_imperative::session::auth_order::remove_temp_files;
use zowe_imperative::session::{
    CommandArguments, ConnectionOptions, ConnectionPropsForSessCfg, Session, SessionConfig,
};
use zowe_imperative::settings::ImperativeSettings;

const SERVICE_DESCRIPTION: &str = "z/OSMF";

/// Resolve the z/OSMF session and print it with secrets hidden
pub async fn resolve(conn: &ConnectionArgs) -> ImperativeResult<()> {
    let console = CliConsole::new(true);
    let settings = ImperativeSettings::from_env()?;
    let cwd = working_dir()?;
    let vault = open_vault(&settings);
    let prompter: Arc<dyn Prompter> = Arc::new(TerminalPrompter::new(settings.prompt_timeout()));
    let imperative = Arc::new(ImperativeConfig::load(settings, &cwd, Some(vault)).await?);

    let mut args = conn.to_arguments();
    let zosmf_profile = fill_from_profiles(&imperative, &mut args).await;

    let initial = SessionConfig {
        reject_unauthorized: args.get("rejectUnauthorized").and_then(Value::as_bool),
        base_path: args.get_str("basePath"),
        profile: zosmf_profile,
        ..Default::default()
    };

    let parms = HandlerContext::new(args.clone())
        .with_required_profile("zosmf")
        .with_optional_profile("base")
        .with_console(prompter.clone());
    let opts = ConnectionOptions::new()
        .with_request_token(conn.request_token)
        .with_do_prompting(!conn.no_prompt)
        .with_service_description(SERVICE_DESCRIPTION)
        .with_parms(parms);

    let resolver = ConnectionPropsForSessCfg::new(prompter).with_imperative(imperative);
    let mut sess_cfg = resolver.add_props_or_prompt(&initial, &args, opts).await?;

    let shown = Session::new(sess_cfg.clone()).map(|session| {
        console.print_header("Resolved session");
        console.info(&format!(
            "{}://{}:{} using {} authentication",
            session.protocol(),
            session.hostname(),
            session.port(),
            session.auth_type()
        ));
        console.print_json(&resolver.secure_props().censor(&session.config().to_value()));
    });
    remove_temp_files(&mut sess_cfg);
    shown
}

/// Fill arguments missing from the command line with z/OSMF profile values,
/// then base profile values.
///
/// Returns the z/OSMF profile name when that profile exists.
async fn fill_from_profiles(
    imperative: &ImperativeConfig,
    args: &mut CommandArguments,
) -> Option<String> {
    let lock = imperative.config()?;
    let config = lock.read().await;
    if !config.exists() {
        return None;
    }

    let zosmf = config.active_profile_name("zosmf", Some(&*args), None);
    let base = config.active_profile_name("base", Some(&*args), None);
    for profile_name in [&zosmf, &base] {
        if !config.profile_exists(profile_name) {
            continue;
        }
        for (prop, value) in config.get_profile(profile_name) {
            if !args.has_value(&prop) {
                args.insert(prop, value);
            }
        }
    }
    config.profile_exists(&zosmf).then_some(zosmf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_profile_values_fill_missing_arguments() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            project.path().join("zowe.config.json"),
            json!({
                "profiles": {
                    "lpar1": {"type": "zosmf", "properties": {"host": "lpar1.example.com", "port": 1443}},
                    "base": {"type": "base", "properties": {"rejectUnauthorized": false, "port": 443}}
                },
                "defaults": {"zosmf": "lpar1", "base": "base"}
            })
            .to_string(),
        )
        .unwrap();

        let settings = ImperativeSettings::default().with_cli_home(home.path());
        let imperative = ImperativeConfig::load(settings, project.path(), None).await.unwrap();

        let mut args = CommandArguments::new().with("host", "override.example.com");
        let profile = fill_from_profiles(&imperative, &mut args).await;

        assert_eq!(profile.as_deref(), Some("lpar1"));
        assert_eq!(args.get_str("host").as_deref(), Some("override.example.com"));
        assert_eq!(args.get("port"), Some(&json!(1443)));
        assert_eq!(args.get("rejectUnauthorized"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn test_no_config_leaves_arguments_alone() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let settings = ImperativeSettings::default().with_cli_home(home.path());
        let imperative = ImperativeConfig::load(settings, project.path(), None).await.unwrap();

        let mut args = CommandArguments::new();
        assert!(fill_from_profiles(&imperative, &mut args).await.is_none());
        assert!(args.is_empty());
    }
}
