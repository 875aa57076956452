//! Mathcrew SDK
//!
//! Shared types for the engine and for consumers of its event stream:
//! the error taxonomy and the tool request/response wire shapes.

/// Error types and handling
pub mod errors;

/// Tool input/output types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, ErrorExt, ValidationReason};
pub use types::{
    EvaluationPayload, FailureBody, FailurePayload, ToolError, ToolRequest, ToolResponse,
};
