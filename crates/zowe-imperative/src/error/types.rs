//! Core error types and traits for the imperative core

use thiserror::Error;

/// Result type alias for imperative operations
pub type ImperativeResult<T> = Result<T, ImperativeError>;

/// Unified error trait implemented by [`ImperativeError`].
///
/// Gives callers a stable error code plus the message and optional context
/// without matching on every variant.
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C: std::fmt::Display>(self, context: C) -> ImperativeResult<T>;

    /// Add context lazily (only evaluated on error)
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> ImperativeResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context<C: std::fmt::Display>(self, context: C) -> ImperativeResult<T> {
        self.map_err(|e| ImperativeError::other(format!("{}: {}", context, e)))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> ImperativeResult<T> {
        self.map_err(|e| ImperativeError::other(format!("{}: {}", f(), e)))
    }
}

/// Main error type for the imperative core
///
/// No variant ever carries the value of a secure property. Variants that
/// relate to a single connection property only name it.
#[derive(Error, Debug, Clone)]
pub enum ImperativeError {
    /// Team configuration errors (layers, profiles, settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// A required connection property is still missing after prompting
    #[error("Unable to resolve a value for '{property}' required to connect to {service}.")]
    MissingProperty {
        property: String,
        service: String,
        context: Option<String>,
    },

    /// A numeric property received an answer that is not a number
    #[error("Specified {property} was not a number: '{value}'.")]
    InvalidNumber {
        property: String,
        value: String,
        context: Option<String>,
    },

    /// The prompt primitive gave up waiting for an answer
    #[error("Timed out waiting for {property}.")]
    PromptTimeout {
        property: String,
        context: Option<String>,
    },

    /// Secure vault lookups and writes
    #[error("Credential vault error: {message}")]
    Credential {
        message: String,
        context: Option<String>,
    },

    /// Session validation failures
    #[error("{message}")]
    Session {
        message: String,
        additional_details: Option<String>,
        context: Option<String>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
        context: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        context: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        context: Option<String>,
    },

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}
