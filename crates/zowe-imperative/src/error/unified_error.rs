//! UnifiedError trait implementation for ImperativeError

use super::types::{ImperativeError, UnifiedError};

impl UnifiedError for ImperativeError {
    fn error_code(&self) -> &str {
        match self {
            Self::Config { .. } => "ZOWE_CONFIG",
            Self::MissingProperty { .. } => "ZOWE_MISSING_PROPERTY",
            Self::InvalidNumber { .. } => "ZOWE_INVALID_NUMBER",
            Self::PromptTimeout { .. } => "ZOWE_PROMPT_TIMEOUT",
            Self::Credential { .. } => "ZOWE_CREDENTIAL",
            Self::Session { .. } => "ZOWE_SESSION",
            Self::Io { .. } => "ZOWE_IO",
            Self::Json { .. } => "ZOWE_JSON",
            Self::InvalidInput { .. } => "ZOWE_INVALID_INPUT",
            Self::Other { .. } => "ZOWE_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Config { message, .. } => message,
            Self::MissingProperty { property, .. } => property,
            Self::InvalidNumber { property, .. } => property,
            Self::PromptTimeout { property, .. } => property,
            Self::Credential { message, .. } => message,
            Self::Session { message, .. } => message,
            Self::Io { message, .. } => message,
            Self::Json { message, .. } => message,
            Self::InvalidInput { message, .. } => message,
            Self::Other { message, .. } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. } => context.as_deref(),
            Self::MissingProperty { context, .. } => context.as_deref(),
            Self::InvalidNumber { context, .. } => context.as_deref(),
            Self::PromptTimeout { context, .. } => context.as_deref(),
            Self::Credential { context, .. } => context.as_deref(),
            Self::Session { context, .. } => context.as_deref(),
            Self::Io { context, .. } => context.as_deref(),
            Self::Json { context, .. } => context.as_deref(),
            Self::InvalidInput { context, .. } => context.as_deref(),
            Self::Other { context, .. } => context.as_deref(),
        }
    }
}
