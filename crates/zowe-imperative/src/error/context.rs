//! Context management for ImperativeError

use super::types::ImperativeError;

impl ImperativeError {
    /// Add context to any error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let ctx = Some(context.into());
        match &mut self {
            Self::Config { context: c, .. } => *c = ctx,
            Self::MissingProperty { context: c, .. } => *c = ctx,
            Self::InvalidNumber { context: c, .. } => *c = ctx,
            Self::PromptTimeout { context: c, .. } => *c = ctx,
            Self::Credential { context: c, .. } => *c = ctx,
            Self::Session { context: c, .. } => *c = ctx,
            Self::Io { context: c, .. } => *c = ctx,
            Self::Json { context: c, .. } => *c = ctx,
            Self::InvalidInput { context: c, .. } => *c = ctx,
            Self::Other { context: c, .. } => *c = ctx,
        }
        self
    }

    /// Extra guidance attached to session validation errors
    pub fn additional_details(&self) -> Option<&str> {
        match self {
            Self::Session {
                additional_details, ..
            } => additional_details.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnifiedError;

    #[test]
    fn test_with_context() {
        let err = ImperativeError::config("bad layer").with_context("loading project layer");
        assert_eq!(err.context(), Some("loading project layer"));
        assert_eq!(err.message(), "bad layer");
    }

    #[test]
    fn test_missing_property_message() {
        let err = ImperativeError::missing_property("hostname", "your service");
        assert_eq!(
            err.to_string(),
            "Unable to resolve a value for 'hostname' required to connect to your service."
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = ImperativeError::prompt_timeout("port");
        assert_eq!(err.to_string(), "Timed out waiting for port.");
        assert_eq!(err.error_code(), "ZOWE_PROMPT_TIMEOUT");
    }

    #[test]
    fn test_session_details() {
        let err = ImperativeError::session_with_details(
            "Must have user & password OR base64 encoded credentials",
            "For CLI usage, see 'zowe auth login <service> --help'",
        );
        assert!(err.additional_details().is_some());
        assert!(ImperativeError::config("x").additional_details().is_none());
    }
}
