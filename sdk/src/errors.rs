//! Error types and handling
//!
//! This module provides the error taxonomy shared by the engine and by
//! consumers of its event stream. All errors implement the `ErrorExt` trait
//! which provides user-friendly hints and indicates whether errors are
//! recoverable.
//!
//! # Security
//!
//! Error messages never carry credentials. Configuration errors name the
//! missing variable, never its value.

use std::fmt;
use thiserror::Error;

/// Trait for engine error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait ErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be corrected by the caller (a different
    /// expression, a new upload). Non-recoverable errors require changing the
    /// process environment and restarting.
    fn is_recoverable(&self) -> bool;
}

/// Reason attached to a validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationReason {
    /// The expression was empty or whitespace only
    EmptyInput,

    /// The expression could not be parsed
    SyntaxError,

    /// The expression used an operator outside `+ - * /`
    UnsupportedOperator,
}

impl ValidationReason {
    /// Stable name used in structured payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationReason::EmptyInput => "EmptyInput",
            ValidationReason::SyntaxError => "SyntaxError",
            ValidationReason::UnsupportedOperator => "UnsupportedOperator",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Validation**: empty or malformed expression, unsupported operator
/// - **Arithmetic**: division by zero or a non-finite value
/// - **Configuration**: missing or invalid startup configuration (fatal)
/// - **Capability invocation**: opaque failure from the inference provider,
///   passed through unchanged and never retried
/// - **Orchestration**: stage aborts and controller loop guards
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, ErrorExt};
///
/// let error = EngineError::Arithmetic("Division by zero is not allowed.".to_string());
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::Configuration("OPENAI_API_KEY not set".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Evaluator errors
    #[error("Validation error ({reason}): {message}")]
    Validation {
        reason: ValidationReason,
        message: String,
    },

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Inference provider errors
    #[error("Capability '{capability}' invocation failed: {message}")]
    CapabilityInvocation { capability: String, message: String },

    // Orchestration errors
    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    #[error("Controller did not delegate within {0} rounds")]
    MaxRoundsExceeded(usize),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Validation { reason, .. } => match reason {
                ValidationReason::EmptyInput => "Provide a non-empty arithmetic expression",
                ValidationReason::SyntaxError => {
                    "Check the expression for unbalanced parentheses or stray characters"
                }
                ValidationReason::UnsupportedOperator => {
                    "Only +, -, *, / and parentheses are supported"
                }
            },
            Self::Arithmetic(_) => "The expression divides by zero or exceeds the numeric range",
            Self::Configuration(_) => "Set OPENAI_API_KEY or check your config file",
            Self::CapabilityInvocation { .. } => {
                "The inference provider failed. Check your API key and network"
            }
            Self::StageFailed { .. } => "A pipeline stage failed; no answer was produced",
            Self::MaxRoundsExceeded(_) => "The controller never handed off. Try rephrasing",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_includes_reason() {
        let err = EngineError::Validation {
            reason: ValidationReason::SyntaxError,
            message: "Invalid expression '2 +'.".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("SyntaxError"));
        assert!(text.contains("2 +"));
    }

    #[test]
    fn test_configuration_is_fatal() {
        let err = EngineError::Configuration("missing".to_string());
        assert!(!err.is_recoverable());
        assert!(EngineError::MaxRoundsExceeded(3).is_recoverable());
    }

    #[test]
    fn test_hints_differ_per_reason() {
        let empty = EngineError::Validation {
            reason: ValidationReason::EmptyInput,
            message: String::new(),
        };
        let op = EngineError::Validation {
            reason: ValidationReason::UnsupportedOperator,
            message: String::new(),
        };
        assert_ne!(empty.user_hint(), op.user_hint());
    }
}
