//! Orchestration
//!
//! Pipelines sequence capability invocations for one turn. Two strategies are
//! available:
//!
//! - [`SequentialPipeline`]: fixed Math → CreativeWriting → Synthesizer order
//! - [`ToolDrivenPipeline`]: a reasoning controller picks tools until it
//!   delegates to the synthesizer
//!
//! Both return a [`RunReport`] holding the stage outputs, the rendered event
//! stream and the audit trail of the run. A turn is processed to completion
//! before the next one is accepted; capability calls within a turn never
//! overlap.

pub mod audit;
pub mod sequential;
pub mod tool_driven;

pub use audit::{AuditTrail, CapabilityInvocation};
pub use sequential::SequentialPipeline;
pub use tool_driven::ToolDrivenPipeline;

use crate::capabilities::{
    Capability, CapabilityError, CapabilityOutput, CreativeWritingCapability, MathCapability,
    ReasoningController, SynthesizerCapability, TurnContext,
};
use crate::config::Config;
use crate::llm::LLMProvider;
use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Orchestration strategy
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineKind {
    #[default]
    Sequential,
    ToolDriven,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Sequential => write!(f, "sequential"),
            PipelineKind::ToolDriven => write!(f, "tool-driven"),
        }
    }
}

/// One item of the event stream shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Message { author: String, text: String },
    ToolCall { name: String, args: Value },
    ToolResponse { name: String, response: Value },
}

impl RunEvent {
    /// Single-line rendering
    pub fn render(&self) -> String {
        match self {
            RunEvent::Message { author, text } => format!("{} {}", author, text.trim()),
            RunEvent::ToolCall { name, args } => format!("[tool-call] {}({})", name, args),
            RunEvent::ToolResponse { name, response } => {
                format!("[tool-response] {}: {}", name, response)
            }
        }
    }
}

/// Output of one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageOutput {
    pub capability: String,
    pub text: String,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Stage outputs in execution order; the last is the synthesizer's
    pub outputs: Vec<StageOutput>,
    pub events: Vec<RunEvent>,
    pub audit: AuditTrail,

    /// The only user-facing text
    pub final_response: String,
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    fn kind(&self) -> PipelineKind;

    /// Process one turn to completion
    async fn run(&self, ctx: TurnContext) -> Result<RunReport, EngineError>;
}

/// Invoke a capability and append the outcome to the audit trail
pub(crate) async fn invoke_recorded(
    capability: &dyn Capability,
    ctx: &TurnContext,
    audit: &mut AuditTrail,
) -> Result<CapabilityOutput, CapabilityError> {
    let snapshot = ctx.snapshot_ref();
    let outcome = capability.invoke(ctx).await;
    match &outcome {
        Ok(output) => {
            audit.record(capability.name(), snapshot, output.to_value(), true);
        }
        Err(e) => {
            audit.record(capability.name(), snapshot, e.payload(), false);
        }
    }
    outcome
}

/// Build the pipeline of the requested kind over one provider
pub fn build_pipeline(
    kind: PipelineKind,
    config: &Config,
    provider: Arc<dyn LLMProvider>,
) -> Box<dyn Pipeline> {
    let temperature = config.llm.temperature;
    let math = Arc::new(MathCapability::new(
        Arc::clone(&provider),
        temperature,
        config.pipeline.max_tool_iterations,
    ));
    let creative = Arc::new(CreativeWritingCapability::new(
        Arc::clone(&provider),
        config.llm.creative_temperature(),
    ));
    let synthesizer = Arc::new(SynthesizerCapability::new(Arc::clone(&provider), temperature));

    match kind {
        PipelineKind::Sequential => Box::new(SequentialPipeline::new(math, creative, synthesizer)),
        PipelineKind::ToolDriven => Box::new(ToolDrivenPipeline::new(
            Arc::new(ReasoningController::new(provider, temperature)),
            math,
            creative,
            synthesizer,
            config.pipeline.max_controller_rounds,
        )),
    }
}
