//! From trait implementations for ImperativeError conversions

use super::types::ImperativeError;

impl From<anyhow::Error> for ImperativeError {
    fn from(error: anyhow::Error) -> Self {
        Self::other(error.to_string())
    }
}

impl From<std::io::Error> for ImperativeError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for ImperativeError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<tokio::task::JoinError> for ImperativeError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::other(format!("background task failed: {}", error))
    }
}
