//! Tool request/response types
//!
//! Wire shapes exchanged when one capability is invoked as a tool by another,
//! and the payloads produced by the arithmetic evaluator tool.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request to invoke a capability (or the evaluator) as a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolRequest {
    /// Create a new request with no arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Map::new(),
        }
    }

    /// Add an argument
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Parse arguments from a JSON object string as produced by a model
    pub fn from_json_arguments(name: impl Into<String>, raw: &str) -> Result<Self, ToolError> {
        let value: Value = if raw.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments(e.to_string()))?
        };
        match value {
            Value::Object(arguments) => Ok(Self {
                name: name.into(),
                arguments,
            }),
            other => Err(ToolError::InvalidArguments(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    /// Get a string argument
    pub fn arg_str(&self, key: &str) -> Result<&str, ToolError> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::MissingArgument(key.to_string()))
    }

    /// Get an optional string argument
    pub fn arg_str_opt(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// Response delivered back to the requester of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub name: String,
    pub response: Value,
}

impl ToolResponse {
    /// Create a structured response
    pub fn json(name: impl Into<String>, response: Value) -> Self {
        Self {
            name: name.into(),
            response,
        }
    }

    /// Create a plain-text response, wrapped as `{"result": text}`
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: serde_json::json!({ "result": text.into() }),
        }
    }

    /// Whether the response carries an `error` object
    pub fn is_error(&self) -> bool {
        self.response.get("error").is_some()
    }
}

/// Successful output of the evaluator tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPayload {
    pub expression: String,
    pub result: f64,
    pub operations_count: usize,
    pub steps: Vec<String>,
}

/// Failure output of a tool: an error kind and message, nothing else
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePayload {
    pub error: FailureBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureBody {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub message: String,
}

impl FailurePayload {
    pub fn new(kind: impl Into<String>, reason: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            error: FailureBody {
                kind: kind.into(),
                reason: reason.map(str::to_string),
                message: message.into(),
            },
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Tool-level errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_request_from_json_arguments() {
        let req = ToolRequest::from_json_arguments("math_agent", r#"{"request": "2 + 2"}"#)
            .unwrap();
        assert_eq!(req.name, "math_agent");
        assert_eq!(req.arg_str("request").unwrap(), "2 + 2");
        assert!(req.arg_str("missing").is_err());
    }

    #[test]
    fn test_tool_request_empty_arguments() {
        let req = ToolRequest::from_json_arguments("transfer_to_agent", "  ").unwrap();
        assert!(req.arguments.is_empty());
    }

    #[test]
    fn test_tool_request_rejects_non_object() {
        let err = ToolRequest::from_json_arguments("math_agent", "[1, 2]").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_failure_payload_has_no_numeric_fields() {
        let payload = FailurePayload::new(
            "ArithmeticError",
            Some("DivisionByZero"),
            "Division by zero is not allowed.",
        );
        let value = payload.to_value();
        assert!(value.get("result").is_none());
        assert!(value.get("operations_count").is_none());
        assert_eq!(value["error"]["kind"], "ArithmeticError");
        assert!(ToolResponse::json("compute_basic_math", value).is_error());
    }

    #[test]
    fn test_text_response_shape() {
        let resp = ToolResponse::text("poetry_agent", "a poem");
        assert_eq!(resp.response["result"], "a poem");
        assert!(!resp.is_error());
    }
}
