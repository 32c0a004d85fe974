//! Command routing logic for CLI

use crate::args::{Cli, Commands, ConfigAction, SessionAction};
use crate::commands;
use crate::console::CliConsole;
use zowe_imperative::error::{ImperativeResult, UnifiedError};

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> ImperativeResult<()> {
    let result = match cli.command {
        Commands::Session { action } => match action {
            SessionAction::Resolve(conn) => commands::session::resolve(&conn).await,
        },
        Commands::Config { action } => route_config(action).await,
    };

    if let Err(e) = &result {
        let console = CliConsole::new(false);
        console.error(&e.to_string());
        if let Some(details) = e.additional_details() {
            console.error(details);
        }
        tracing::debug!("Command failed with {}", e.error_code());
    }
    result
}

async fn route_config(action: ConfigAction) -> ImperativeResult<()> {
    match action {
        ConfigAction::List => commands::config::list().await,
        ConfigAction::Set {
            path,
            value,
            secure,
            user_config,
            global_config,
        } => commands::config::set(&path, &value, secure, user_config, global_config).await,
    }
}
