//! Evaluator exposed as a tool
//!
//! Errors are returned as structured tool results rather than propagated, so
//! the model driving the tool can react to them conversationally.

use super::evaluate;
use crate::llm::ToolSpec;
use sdk::types::{FailurePayload, ToolRequest, ToolResponse};
use serde_json::json;
use tracing::debug;

pub const TOOL_NAME: &str = "compute_basic_math";

/// Tool description advertised to models
pub fn spec() -> ToolSpec {
    ToolSpec::new(
        TOOL_NAME,
        "Evaluate an arithmetic expression composed of numbers, +, -, *, / and parentheses. \
         Returns the normalized expression, the result, the number of operations and each step.",
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression, e.g. '(10 - 4) / 3'"
                }
            },
            "required": ["expression"]
        }),
    )
}

/// Execute a tool request against the evaluator
pub fn call(request: &ToolRequest) -> ToolResponse {
    let response = match request.arg_str("expression") {
        Ok(expression) => match evaluate(expression) {
            Ok(result) => {
                debug!(
                    "Evaluated '{}' = {} ({} operations)",
                    result.expression, result.result, result.operations_count
                );
                serde_json::to_value(result.to_payload()).unwrap_or_default()
            }
            Err(e) => {
                debug!("Evaluation of '{}' failed: {}", expression, e);
                e.to_payload().to_value()
            }
        },
        Err(e) => FailurePayload::new("ValidationError", Some("EmptyInput"), e.to_string()).to_value(),
    };
    ToolResponse::json(TOOL_NAME, response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_payload() {
        let resp = call(&ToolRequest::new(TOOL_NAME).with_arg("expression", "2 + 3 * 4"));
        assert_eq!(resp.name, TOOL_NAME);
        assert_eq!(resp.response["result"], 14.0);
        assert_eq!(resp.response["operations_count"], 2);
        assert_eq!(resp.response["steps"][0], "3 × 4 = 12.0");
        assert!(!resp.is_error());
    }

    #[test]
    fn test_failure_payload_carries_only_kind_and_message() {
        let resp = call(&ToolRequest::new(TOOL_NAME).with_arg("expression", "5 / 0"));
        assert!(resp.is_error());
        assert_eq!(resp.response["error"]["kind"], "ArithmeticError");
        assert_eq!(resp.response["error"]["reason"], "DivisionByZero");
        assert!(resp.response.get("result").is_none());
        assert!(resp.response.get("steps").is_none());
    }

    #[test]
    fn test_missing_argument() {
        let resp = call(&ToolRequest::new(TOOL_NAME));
        assert_eq!(resp.response["error"]["kind"], "ValidationError");
    }

    #[test]
    fn test_overflow_is_an_arithmetic_failure() {
        let expression = format!("1{} * 10", "0".repeat(400));
        let resp = call(&ToolRequest::new(TOOL_NAME).with_arg("expression", expression));
        assert!(resp.is_error());
        assert_eq!(resp.response["error"]["kind"], "ArithmeticError");
        assert_eq!(resp.response["error"]["reason"], "Overflow");
        assert!(resp.response.get("result").is_none());
    }

    #[test]
    fn test_overlong_chain_is_a_validation_failure() {
        let expression = vec!["1"; 100_000].join("+");
        let resp = call(&ToolRequest::new(TOOL_NAME).with_arg("expression", expression));
        assert!(resp.is_error());
        assert_eq!(resp.response["error"]["kind"], "ValidationError");
        assert_eq!(resp.response["error"]["reason"], "SyntaxError");
    }
}
