//! Command handler context handed to the resolver

use super::Prompter;
use crate::session::CommandArguments;
use std::fmt;
use std::sync::Arc;

/// What the resolver knows about the command being run
#[derive(Clone, Default)]
pub struct HandlerContext {
    /// Arguments of the command
    pub arguments: CommandArguments,
    /// Profile types the command requires, in order
    pub required_profiles: Vec<String>,
    /// Profile types the command can use, in order
    pub optional_profiles: Vec<String>,
    /// Console used for messages and prompts
    pub console: Option<Arc<dyn Prompter>>,
}

impl HandlerContext {
    /// Create a context for the given arguments
    pub fn new(arguments: CommandArguments) -> Self {
        Self {
            arguments,
            ..Default::default()
        }
    }

    /// Add a required profile type
    pub fn with_required_profile(mut self, profile_type: impl Into<String>) -> Self {
        self.required_profiles.push(profile_type.into());
        self
    }

    /// Add an optional profile type
    pub fn with_optional_profile(mut self, profile_type: impl Into<String>) -> Self {
        self.optional_profiles.push(profile_type.into());
        self
    }

    /// Use this console for messages and prompts
    pub fn with_console(mut self, console: Arc<dyn Prompter>) -> Self {
        self.console = Some(console);
        self
    }

    /// Required then optional profile types
    pub fn profile_types(&self) -> impl Iterator<Item = &String> {
        self.required_profiles.iter().chain(self.optional_profiles.iter())
    }
}

impl fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContext")
            .field("arguments", &self.arguments.len())
            .field("required_profiles", &self.required_profiles)
            .field("optional_profiles", &self.optional_profiles)
            .field("console", &self.console.is_some())
            .finish()
    }
}
