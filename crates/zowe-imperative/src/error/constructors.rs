//! Constructor methods for ImperativeError

use super::types::ImperativeError;

impl ImperativeError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a missing-property error for the given service description
    pub fn missing_property(property: impl Into<String>, service: impl Into<String>) -> Self {
        Self::MissingProperty {
            property: property.into(),
            service: service.into(),
            context: None,
        }
    }

    /// Create a numeric coercion error
    pub fn invalid_number(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            property: property.into(),
            value: value.into(),
            context: None,
        }
    }

    /// Create a prompt timeout error
    pub fn prompt_timeout(property: impl Into<String>) -> Self {
        Self::PromptTimeout {
            property: property.into(),
            context: None,
        }
    }

    /// Create a credential vault error
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
            context: None,
        }
    }

    /// Create a session validation error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
            additional_details: None,
            context: None,
        }
    }

    /// Create a session validation error with a hint for the user
    pub fn session_with_details(
        message: impl Into<String>,
        additional_details: impl Into<String>,
    ) -> Self {
        Self::Session {
            message: message.into(),
            additional_details: Some(additional_details.into()),
            context: None,
        }
    }

    /// Create a new IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
            context: None,
        }
    }

    /// Create an IO error with path
    pub fn io_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
            context: None,
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
            context: None,
        }
    }

    /// Create an invalid input error naming the offending field
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
            context: None,
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            context: None,
        }
    }
}
