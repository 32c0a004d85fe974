//! CLI argument definitions using clap
//!
//! - zowe session resolve [connection options]
//! - zowe config list
//! - zowe config set <path> <value> [--secure] [--user-config] [--global-config]
//!
//! Every connection option can also come from `ZOWE_OPT_<NAME>`.

use clap::{Args, Parser, Subcommand};
use zowe_imperative::session::CommandArguments;

#[derive(Parser)]
#[command(name = "zowe")]
#[command(about = "Zowe CLI - resolve mainframe connection sessions and manage team config")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve connection sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Manage team configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone)]
pub enum SessionAction {
    /// Resolve and print the z/OSMF session a command would use
    Resolve(ConnectionArgs),
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Show every config layer with secure values hidden
    List,

    /// Set a property in the active config layer
    Set {
        /// Dotted property path, e.g. profiles.base.properties.host
        path: String,

        /// Value; parsed as JSON when possible
        value: String,

        /// Store the value in the secure vault
        #[arg(long)]
        secure: bool,

        /// Write to the user config layer
        #[arg(long)]
        user_config: bool,

        /// Write to the global config layer
        #[arg(long)]
        global_config: bool,
    },
}

/// Connection options shared by commands that open a session
#[derive(Args, Clone, Debug, Default)]
pub struct ConnectionArgs {
    /// Host name of the service on the mainframe
    #[arg(long, env = "ZOWE_OPT_HOST")]
    pub host: Option<String>,

    /// Port number of the service
    #[arg(long, env = "ZOWE_OPT_PORT")]
    pub port: Option<u16>,

    /// User name to authenticate with
    #[arg(long, env = "ZOWE_OPT_USER", hide_env_values = true)]
    pub user: Option<String>,

    /// Password to authenticate with
    #[arg(long, env = "ZOWE_OPT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Type of token to get and use
    #[arg(long, env = "ZOWE_OPT_TOKEN_TYPE")]
    pub token_type: Option<String>,

    /// Token value to authenticate with
    #[arg(long, env = "ZOWE_OPT_TOKEN_VALUE", hide_env_values = true)]
    pub token_value: Option<String>,

    /// Path to a PEM certificate file
    #[arg(long, env = "ZOWE_OPT_CERT_FILE")]
    pub cert_file: Option<String>,

    /// Path to a PEM certificate key file
    #[arg(long, env = "ZOWE_OPT_CERT_KEY_FILE")]
    pub cert_key_file: Option<String>,

    /// Comma-separated auth types to try, in order
    #[arg(long, env = "ZOWE_OPT_AUTH_ORDER")]
    pub auth_order: Option<String>,

    /// Reject self-signed certificates
    #[arg(long, env = "ZOWE_OPT_REJECT_UNAUTHORIZED")]
    pub reject_unauthorized: Option<bool>,

    /// Base path of the API mediation layer
    #[arg(long, env = "ZOWE_OPT_BASE_PATH")]
    pub base_path: Option<String>,

    /// Treat credentials as login inputs for a new token
    #[arg(long, env = "ZOWE_OPT_REQUEST_TOKEN")]
    pub request_token: bool,

    /// Never prompt; fail or continue with what is known
    #[arg(long, env = "ZOWE_OPT_NO_PROMPT")]
    pub no_prompt: bool,

    /// z/OSMF profile to read connection properties from
    #[arg(long, env = "ZOWE_OPT_ZOSMF_PROFILE")]
    pub zosmf_profile: Option<String>,

    /// Base profile to read shared properties from
    #[arg(long, env = "ZOWE_OPT_BASE_PROFILE")]
    pub base_profile: Option<String>,
}

impl ConnectionArgs {
    /// Command arguments under the names profiles and the resolver use
    pub fn to_arguments(&self) -> CommandArguments {
        let mut args = CommandArguments::new();
        let strings = [
            ("host", &self.host),
            ("user", &self.user),
            ("password", &self.password),
            ("tokenType", &self.token_type),
            ("tokenValue", &self.token_value),
            ("certFile", &self.cert_file),
            ("certKeyFile", &self.cert_key_file),
            ("authOrder", &self.auth_order),
            ("basePath", &self.base_path),
            ("zosmfProfile", &self.zosmf_profile),
            ("baseProfile", &self.base_profile),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                args.insert(name, value.clone());
            }
        }
        if let Some(port) = self.port {
            args.insert("port", port);
        }
        if let Some(reject) = self.reject_unauthorized {
            args.insert("rejectUnauthorized", reject);
        }
        args
    }
}
