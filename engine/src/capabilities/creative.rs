//! Creative writing capability
//!
//! Writes a short poem about a completed computation when the user asked for
//! one, and otherwise declines briefly. Declining is the model's decision; the
//! pipelines never skip this stage on its behalf.

use super::{Capability, CapabilityError, CapabilityKind, CapabilityOutput, TurnContext};
use crate::llm::{GenerateOptions, LLMProvider, LLMResponse};
use async_trait::async_trait;
use std::sync::Arc;

const INSTRUCTIONS: &str = "You are a whimsical poetry specialist. You receive context \
describing a completed math computation (original request, final result, operations_count). \
If the user explicitly asked for creativity, verse or celebration, write a concise uplifting \
poem of 3 to 5 lines referencing the result and the operations count. If the user did not ask \
for creativity, reply briefly that no poem was requested. If key information is missing, ask \
for clarification instead of inventing numbers.";

pub struct CreativeWritingCapability {
    provider: Arc<dyn LLMProvider>,
    temperature: f64,
}

impl CreativeWritingCapability {
    /// `temperature` is expected to already include the creative floor
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f64) -> Self {
        Self {
            provider,
            temperature,
        }
    }
}

#[async_trait]
impl Capability for CreativeWritingCapability {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::CreativeWriting
    }

    async fn invoke(&self, ctx: &TurnContext) -> Result<CapabilityOutput, CapabilityError> {
        let messages = ctx.to_messages(INSTRUCTIONS);
        let response = self
            .provider
            .generate(&messages, &GenerateOptions::new(self.temperature))
            .await?;
        Ok(CapabilityOutput::Reply(final_text(response)))
    }
}

/// Text of a response from a call that offered no tools
pub(crate) fn final_text(response: LLMResponse) -> String {
    match response {
        LLMResponse::FinalAnswer(answer) => answer.content,
        LLMResponse::ToolCall(call) => format!("{}({})", call.name, call.arguments),
    }
}
