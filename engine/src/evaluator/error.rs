use sdk::errors::{EngineError, ValidationReason};
use sdk::types::FailurePayload;

/// Broad category of an evaluation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    ValidationError,
    ArithmeticError,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::ValidationError => "ValidationError",
            ErrorCategory::ArithmeticError => "ArithmeticError",
        }
    }
}

/// Errors raised while parsing or evaluating an expression
///
/// Any error aborts the whole evaluation; no partial result is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("Expression must be a non-empty string.")]
    EmptyInput,

    #[error("Invalid expression '{expression}': {detail}")]
    Syntax { expression: String, detail: String },

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Division by zero is not allowed.")]
    DivisionByZero,

    /// A literal or intermediate value left the finite `f64` range
    #[error("Result of '{0}' is not a finite number.")]
    Overflow(String),
}

impl EvalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EvalError::DivisionByZero | EvalError::Overflow(_) => ErrorCategory::ArithmeticError,
            _ => ErrorCategory::ValidationError,
        }
    }

    /// Fine-grained reason name, e.g. `SyntaxError` or `DivisionByZero`
    pub fn reason(&self) -> &'static str {
        match self {
            EvalError::EmptyInput => ValidationReason::EmptyInput.as_str(),
            EvalError::Syntax { .. } => ValidationReason::SyntaxError.as_str(),
            EvalError::UnsupportedOperator(_) => ValidationReason::UnsupportedOperator.as_str(),
            EvalError::DivisionByZero => "DivisionByZero",
            EvalError::Overflow(_) => "Overflow",
        }
    }

    /// Structured failure payload returned to tool callers
    pub fn to_payload(&self) -> FailurePayload {
        FailurePayload::new(self.category().as_str(), Some(self.reason()), self.to_string())
    }
}

impl From<EvalError> for EngineError {
    fn from(err: EvalError) -> Self {
        let message = err.to_string();
        match err {
            EvalError::EmptyInput => EngineError::Validation {
                reason: ValidationReason::EmptyInput,
                message,
            },
            EvalError::Syntax { .. } => EngineError::Validation {
                reason: ValidationReason::SyntaxError,
                message,
            },
            EvalError::UnsupportedOperator(_) => EngineError::Validation {
                reason: ValidationReason::UnsupportedOperator,
                message,
            },
            EvalError::DivisionByZero | EvalError::Overflow(_) => EngineError::Arithmetic(message),
        }
    }
}
