use super::creative::final_text;
use super::{Capability, CapabilityError, CapabilityKind, CapabilityOutput, TurnContext};
use crate::llm::{GenerateOptions, LLMProvider};
use async_trait::async_trait;
use std::sync::Arc;

const INSTRUCTIONS: &str = "You are the final narrator. Review the latest replies from \
math_agent and poetry_agent, if present. Give a clear numeric summary of the math result, \
mentioning the number of operations when available. If a poem was provided, quote or \
paraphrase it; otherwise mention that no poem was requested. Close with encouraging language \
so the user has a complete answer in one message.";

/// Produces the only user-facing response of a run
pub struct SynthesizerCapability {
    provider: Arc<dyn LLMProvider>,
    temperature: f64,
}

impl SynthesizerCapability {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f64) -> Self {
        Self {
            provider,
            temperature,
        }
    }
}

#[async_trait]
impl Capability for SynthesizerCapability {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Synthesizer
    }

    async fn invoke(&self, ctx: &TurnContext) -> Result<CapabilityOutput, CapabilityError> {
        let response = self
            .provider
            .generate(
                &ctx.to_messages(INSTRUCTIONS),
                &GenerateOptions::new(self.temperature),
            )
            .await?;
        Ok(CapabilityOutput::Reply(final_text(response)))
    }
}
