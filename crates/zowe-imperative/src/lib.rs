//! Zowe Imperative Core Library
//!
//! Resolves everything a command needs to open a session with a mainframe
//! service: connection properties, the credentials to send, and the team
//! configuration those come from.

pub mod config;
pub mod error;
pub mod prompt;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use config::{AuthHandler, AutoStore, Config, ConfigAutoStore, CredentialVault, ImperativeConfig, MemoryVault};
pub use error::{ImperativeError, ImperativeResult};
pub use prompt::{HandlerContext, PromptOptions, Prompter, TerminalPrompter};
pub use session::{
    AuthType, CommandArguments, ConnectionOptions, ConnectionPropsForSessCfg, PromptProp,
    PropertyOverride, SecurePropRegistry, Session, SessionConfig, ValuesProvider,
};
pub use settings::ImperativeSettings;
