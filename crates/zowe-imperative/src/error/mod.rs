//! Error types for the imperative core
//!
//! A single error enum is shared by every module of the crate. All errors
//! implement the `UnifiedError` trait which provides consistent fields:
//! - error_code: A unique identifier for programmatic error handling
//! - message: Human-readable error message
//! - context: Optional additional context about where/why the error occurred

mod constructors;
mod context;
mod conversions;
mod types;
mod unified_error;

pub use types::{ImperativeError, ImperativeResult, ResultExt, UnifiedError};
