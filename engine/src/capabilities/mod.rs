//! Capabilities
//!
//! A capability is one unit of work over a turn's context. Every specialist
//! (math, creative writing, synthesis, image transcription and the reasoning
//! controller) implements the same [`Capability`] trait, so pipelines compose
//! them without knowing which variant they hold.
//!
//! Capabilities are stateless between invocations: everything they need is in
//! the [`TurnContext`] passed to `invoke`. The only exception is image
//! transcription, which reads and refreshes the per-session attachment cache.

pub mod controller;
pub mod creative;
pub mod math;
pub mod synthesizer;
pub mod transcription;

pub use controller::ReasoningController;
pub use creative::CreativeWritingCapability;
pub use math::MathCapability;
pub use synthesizer::SynthesizerCapability;
pub use transcription::ImageTranscriptionCapability;

use crate::llm::{LLMError, Message};
use crate::session::Attachment;
use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::{ToolRequest, ToolResponse};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Which specialist a capability is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Math,
    CreativeWriting,
    Synthesizer,
    ImageTranscription,
    ReasoningController,
}

impl CapabilityKind {
    /// Name under which the capability appears in events and tool calls
    pub fn agent_name(&self) -> &'static str {
        match self {
            CapabilityKind::Math => "math_agent",
            CapabilityKind::CreativeWriting => "poetry_agent",
            CapabilityKind::Synthesizer => "synthesizer_agent",
            CapabilityKind::ImageTranscription => "ocr_agent",
            CapabilityKind::ReasoningController => "reasoning_tool_orchestrator",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_name())
    }
}

/// Output of an earlier stage, visible to every later one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    pub author: String,
    pub text: String,
}

/// A controller tool call together with the response it received
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolExchange {
    pub call_id: String,
    pub request: ToolRequest,
    pub response: ToolResponse,
}

/// Everything a capability may read during one invocation
#[derive(Debug, Clone, Serialize)]
pub struct TurnContext {
    pub session_id: String,
    pub user_id: String,

    /// The request this invocation is about
    pub request: String,

    /// Prior outputs, in the order they were produced
    pub entries: Vec<ContextEntry>,

    /// Attachments carried by the current turn
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    /// Tool calls made by the controller so far in this run
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exchanges: Vec<ToolExchange>,
}

impl TurnContext {
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        request: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            request: request.into(),
            entries: Vec::new(),
            attachments: Vec::new(),
            exchanges: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Append a stage output
    pub fn push(&mut self, author: impl Into<String>, text: impl Into<String>) {
        self.entries.push(ContextEntry {
            author: author.into(),
            text: text.into(),
        });
    }

    /// Context for a capability invoked as a tool: a new request over the same
    /// accumulated outputs, without the controller's own tool transcript.
    pub fn for_tool(&self, request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            exchanges: Vec::new(),
            attachments: Vec::new(),
            ..self.clone()
        }
    }

    /// Image attachments of the current turn
    pub fn image_attachments(&self) -> Vec<Attachment> {
        self.attachments.iter().filter(|a| a.is_image()).cloned().collect()
    }

    /// BLAKE3 digest of the serialized context, used to reference audit inputs
    pub fn snapshot_ref(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }

    /// Render the context as a conversation: instructions, the request, then
    /// each prior output as context.
    pub fn to_messages(&self, instructions: &str) -> Vec<Message> {
        let mut messages = vec![
            Message::system(instructions),
            Message::user(self.request.as_str()),
        ];
        for entry in &self.entries {
            messages.push(Message::user(format!(
                "For context: [{}] said: {}",
                entry.author, entry.text
            )));
        }
        messages
    }
}

/// What a capability produced
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutput {
    /// Text reply
    Reply(String),

    /// A request to invoke another capability as a tool
    ToolCall(ToolRequest),

    /// Hand the turn over to the synthesizer
    Delegate { note: String },
}

impl CapabilityOutput {
    pub fn text(&self) -> String {
        match self {
            CapabilityOutput::Reply(text) => text.clone(),
            CapabilityOutput::ToolCall(request) => {
                serde_json::to_string(request).unwrap_or_else(|_| request.name.clone())
            }
            CapabilityOutput::Delegate { note } => note.clone(),
        }
    }

    /// Structured form recorded in the audit trail
    pub fn to_value(&self) -> Value {
        match self {
            CapabilityOutput::Reply(text) => serde_json::json!({ "reply": text }),
            CapabilityOutput::ToolCall(request) => serde_json::json!({ "tool_call": request }),
            CapabilityOutput::Delegate { note } => serde_json::json!({ "delegate": note }),
        }
    }
}

/// Capability failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum CapabilityError {
    /// The inference provider failed; passed through unchanged
    #[error(transparent)]
    Invocation(#[from] LLMError),

    /// A tool the capability depends on reported a failure
    #[error("{payload}")]
    ToolFailure { payload: Value },

    #[error("No final answer after {0} model calls")]
    IterationLimit(usize),
}

impl CapabilityError {
    /// Payload handed to a controller when this error is treated as data
    pub fn payload(&self) -> Value {
        match self {
            CapabilityError::ToolFailure { payload } => payload.clone(),
            other => sdk::types::FailurePayload::new(
                "CapabilityInvocationError",
                None,
                other.to_string(),
            )
            .to_value(),
        }
    }

    /// Convert into the engine taxonomy, naming the failing capability
    pub fn into_engine_error(self, capability: &str) -> EngineError {
        match self {
            CapabilityError::Invocation(e) => EngineError::CapabilityInvocation {
                capability: capability.to_string(),
                message: e.to_string(),
            },
            other => EngineError::StageFailed {
                stage: capability.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// A unit of work participating in one turn
#[async_trait]
pub trait Capability: Send + Sync {
    fn kind(&self) -> CapabilityKind;

    /// Name used in events, tool calls and the audit trail
    fn name(&self) -> &str {
        self.kind().agent_name()
    }

    /// Produce an output for the given context
    async fn invoke(&self, ctx: &TurnContext) -> Result<CapabilityOutput, CapabilityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_ref_tracks_content() {
        let mut ctx = TurnContext::new("s1", "u1", "What is 2 + 2?");
        let first = ctx.snapshot_ref();
        assert_eq!(first.len(), 64);
        assert_eq!(first, ctx.snapshot_ref());

        ctx.push("math_agent", "4.0");
        assert_ne!(first, ctx.snapshot_ref());
    }

    #[test]
    fn test_messages_include_prior_outputs_in_order() {
        let mut ctx = TurnContext::new("s1", "u1", "2 + 2, then a poem");
        ctx.push("math_agent", "4.0");
        ctx.push("poetry_agent", "Two and two");
        let messages = ctx.to_messages("instructions");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].content, "2 + 2, then a poem");
        assert!(messages[2].content.contains("[math_agent]"));
        assert!(messages[3].content.contains("[poetry_agent]"));
    }

    #[test]
    fn test_for_tool_keeps_entries_and_drops_transcript() {
        let mut ctx = TurnContext::new("s1", "u1", "original");
        ctx.push("math_agent", "4.0");
        ctx.exchanges.push(ToolExchange {
            call_id: "call_1".to_string(),
            request: ToolRequest::new("math_agent"),
            response: ToolResponse::text("math_agent", "4.0"),
        });
        let sub = ctx.for_tool("write a poem");
        assert_eq!(sub.request, "write a poem");
        assert_eq!(sub.entries.len(), 1);
        assert!(sub.exchanges.is_empty());
    }

    #[test]
    fn test_error_payloads() {
        let failure = CapabilityError::ToolFailure {
            payload: serde_json::json!({"error": {"kind": "ArithmeticError", "message": "x"}}),
        };
        assert_eq!(failure.payload()["error"]["kind"], "ArithmeticError");

        let provider = CapabilityError::Invocation(LLMError::RateLimitExceeded);
        assert_eq!(provider.payload()["error"]["kind"], "CapabilityInvocationError");
        assert!(matches!(
            provider.into_engine_error("math_agent"),
            EngineError::CapabilityInvocation { .. }
        ));
    }
}
