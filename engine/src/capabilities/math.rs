//! Math capability
//!
//! Inference-backed: the model rewrites the request as an expression and
//! calls the `compute_basic_math` evaluator tool. Evaluator failures are fed
//! back to the model as structured tool results so it can react to them.
//!
//! The invocation fails when the last evaluator call failed, carrying that
//! raw failure payload. A model that answers without calling the tool (for a
//! request outside `+ - * /`) produces an ordinary reply.

use super::{Capability, CapabilityError, CapabilityKind, CapabilityOutput, TurnContext};
use crate::evaluator::tool;
use crate::llm::{GenerateOptions, LLMProvider, LLMResponse, Message};
use async_trait::async_trait;
use sdk::types::{FailurePayload, ToolRequest, ToolResponse};
use std::sync::Arc;
use tracing::{debug, info, warn};

const INSTRUCTIONS: &str = "You are a meticulous math specialist. Rewrite the request as an \
arithmetic expression using only numbers, +, -, *, / and parentheses, then call \
`compute_basic_math` with it. Do not answer before the tool returns. Summarize the normalized \
expression, walk through each step and state the result together with operations_count. \
Address the orchestrator, not the end user. If the request cannot be expressed with the \
supported operations, explain the limitation. Finish with \"math agent complete\".";

pub struct MathCapability {
    provider: Arc<dyn LLMProvider>,
    temperature: f64,
    max_iterations: usize,
}

impl MathCapability {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f64, max_iterations: usize) -> Self {
        Self {
            provider,
            temperature,
            max_iterations,
        }
    }

    fn dispatch(name: &str, arguments: &str) -> ToolResponse {
        if name != tool::TOOL_NAME {
            warn!("Math model requested unknown tool '{}'", name);
            return ToolResponse::json(
                name,
                FailurePayload::new("UnknownTool", None, format!("Unknown tool: {}", name))
                    .to_value(),
            );
        }
        match ToolRequest::from_json_arguments(name, arguments) {
            Ok(request) => tool::call(&request),
            Err(e) => ToolResponse::json(
                name,
                FailurePayload::new("ValidationError", Some("SyntaxError"), e.to_string())
                    .to_value(),
            ),
        }
    }
}

#[async_trait]
impl Capability for MathCapability {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Math
    }

    async fn invoke(&self, ctx: &TurnContext) -> Result<CapabilityOutput, CapabilityError> {
        let mut messages = ctx.to_messages(INSTRUCTIONS);
        let options = GenerateOptions::new(self.temperature).with_tools(vec![tool::spec()]);
        let mut last_response: Option<ToolResponse> = None;

        for iteration in 1..=self.max_iterations {
            debug!("Math iteration {}/{}", iteration, self.max_iterations);

            match self.provider.generate(&messages, &options).await? {
                LLMResponse::ToolCall(call) => {
                    debug!("Math tool call: {}({})", call.name, call.arguments);
                    let response = Self::dispatch(&call.name, &call.arguments);
                    messages.push(Message::assistant_tool_call(call.clone()));
                    messages.push(Message::tool_result(response.response.to_string(), &call.id));
                    last_response = Some(response);
                }
                LLMResponse::FinalAnswer(answer) => {
                    return match last_response {
                        Some(response) if response.is_error() => {
                            info!("Math finished after a failed evaluation");
                            Err(CapabilityError::ToolFailure {
                                payload: response.response,
                            })
                        }
                        _ => Ok(CapabilityOutput::Reply(answer.content)),
                    };
                }
            }
        }

        Err(CapabilityError::IterationLimit(self.max_iterations))
    }
}
