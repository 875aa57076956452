//! Reasoning controller
//!
//! Decides, one step at a time, which capability to invoke next. It is offered
//! the math and poetry capabilities as tools plus a `transfer_to_agent` tool
//! to hand the turn to the synthesizer. It never answers the user itself: a
//! plain-text reply is treated as a delegation carrying a note.

use super::{Capability, CapabilityError, CapabilityKind, CapabilityOutput, TurnContext};
use crate::llm::{GenerateOptions, LLMProvider, LLMResponse, Message, ToolCall, ToolSpec};
use async_trait::async_trait;
use sdk::types::ToolRequest;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tool used to hand the turn over to another agent
pub const TRANSFER_TOOL: &str = "transfer_to_agent";

const INSTRUCTIONS: &str = "Solve requests by calling tools and delegating the final answer to \
the synthesizer agent.\n- `math_agent`: send the arithmetic request and wait for its result.\n\
- `poetry_agent`: call ONLY after math succeeds and only if the user wants creativity.\n\
- `transfer_to_agent` with agent_name `synthesizer_agent`: call LAST so it can merge the math \
and optional poem into the final response. Do not write the final answer yourself.";

pub struct ReasoningController {
    provider: Arc<dyn LLMProvider>,
    temperature: f64,
}

impl ReasoningController {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f64) -> Self {
        Self {
            provider,
            temperature,
        }
    }

    /// Tools offered to the controller model
    pub fn tools() -> Vec<ToolSpec> {
        let request_schema = json!({
            "type": "object",
            "properties": {
                "request": { "type": "string", "description": "Request to hand to the agent" }
            },
            "required": ["request"]
        });
        vec![
            ToolSpec::new(
                CapabilityKind::Math.agent_name(),
                "Solves arithmetic expressions (add, subtract, multiply, divide) with a \
                 deterministic evaluator.",
                request_schema.clone(),
            ),
            ToolSpec::new(
                CapabilityKind::CreativeWriting.agent_name(),
                "Composes short poems that celebrate math results.",
                request_schema,
            ),
            ToolSpec::new(
                TRANSFER_TOOL,
                "Transfer the turn to another agent.",
                json!({
                    "type": "object",
                    "properties": {
                        "agent_name": { "type": "string" }
                    },
                    "required": ["agent_name"]
                }),
            ),
        ]
    }

    fn transcript(ctx: &TurnContext) -> Vec<Message> {
        let mut messages = vec![
            Message::system(INSTRUCTIONS),
            Message::user(ctx.request.as_str()),
        ];
        for exchange in &ctx.exchanges {
            let arguments = serde_json::to_string(&exchange.request.arguments)
                .unwrap_or_else(|_| "{}".to_string());
            messages.push(Message::assistant_tool_call(ToolCall::new(
                exchange.call_id.as_str(),
                exchange.request.name.as_str(),
                arguments,
            )));
            messages.push(Message::tool_result(
                exchange.response.response.to_string(),
                exchange.call_id.as_str(),
            ));
        }
        messages
    }
}

#[async_trait]
impl Capability for ReasoningController {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::ReasoningController
    }

    async fn invoke(&self, ctx: &TurnContext) -> Result<CapabilityOutput, CapabilityError> {
        let options = GenerateOptions::new(self.temperature).with_tools(Self::tools());
        match self.provider.generate(&Self::transcript(ctx), &options).await? {
            LLMResponse::ToolCall(call) => {
                debug!("Controller chose {}({})", call.name, call.arguments);
                let request = ToolRequest::from_json_arguments(call.name.as_str(), &call.arguments)
                    .unwrap_or_else(|e| {
                        warn!("Controller sent unreadable arguments for {}: {}", call.name, e);
                        ToolRequest::new(call.name.as_str())
                    });
                Ok(CapabilityOutput::ToolCall(request))
            }
            LLMResponse::FinalAnswer(answer) => {
                debug!("Controller answered in text; treating it as a delegation");
                Ok(CapabilityOutput::Delegate {
                    note: answer.content,
                })
            }
        }
    }
}
