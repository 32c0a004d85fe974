//! Team configuration commands

use super::{open_vault, working_dir};
use crate::console::CliConsole;
use serde_json::Value;
use zowe_imperative::config::Config;
use zowe_imperative::error::ImperativeResult;
use zowe_imperative::settings::ImperativeSettings;

/// Show every existing config layer with secure values hidden
pub async fn list() -> ImperativeResult<()> {
    let console = CliConsole::new(true);
    let settings = ImperativeSettings::from_env()?;
    let config = Config::load(&settings, &working_dir()?)?;

    if !config.exists() {
        console.warn("No Zowe client configuration exists.");
        return Ok(());
    }
    for (path, doc) in config.censored_layers() {
        console.print_header(&path);
        console.print_json(&doc);
    }
    Ok(())
}

/// Set one property in the selected layer and save it
pub async fn set(
    path: &str,
    value: &str,
    secure: bool,
    user_config: bool,
    global_config: bool,
) -> ImperativeResult<()> {
    let console = CliConsole::new(true);
    let settings = ImperativeSettings::from_env()?;
    let vault = open_vault(&settings);
    let mut config = Config::load(&settings, &working_dir()?)?;

    // secure values of every layer are saved together
    config.load_secure(&*vault).await?;
    config.activate(user_config, global_config);
    config.set(path, parse_value(value), secure)?;
    config.save(Some(&*vault)).await?;

    console.success(&format!(
        "Set {} in {}",
        path,
        config.active_layer().display_path()
    ));
    Ok(())
}

/// JSON when the text parses as JSON, a string otherwise
pub fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("443"), json!(443));
        assert_eq!(parse_value("false"), json!(false));
        assert_eq!(parse_value("lpar1.example.com"), json!("lpar1.example.com"));
        assert_eq!(parse_value("[\"basic\"]"), json!(["basic"]));
    }
}
