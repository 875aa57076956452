//! Sequential pipeline
//!
//! Runs Math, then CreativeWriting, then Synthesizer. Each stage sees the
//! request plus every earlier stage's output. Any stage failure aborts the
//! run at once and is returned unchanged; later stages do not run.

use super::{invoke_recorded, AuditTrail, Pipeline, PipelineKind, RunEvent, RunReport, StageOutput};
use crate::capabilities::{Capability, TurnContext};
use async_trait::async_trait;
use sdk::errors::EngineError;
use std::sync::Arc;
use tracing::{error, info};

/// Position in the fixed stage order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingMath,
    AwaitingCreative,
    AwaitingSynthesis,
    Done,
}

impl Stage {
    pub fn next(self) -> Self {
        match self {
            Stage::AwaitingMath => Stage::AwaitingCreative,
            Stage::AwaitingCreative => Stage::AwaitingSynthesis,
            Stage::AwaitingSynthesis | Stage::Done => Stage::Done,
        }
    }
}

pub struct SequentialPipeline {
    math: Arc<dyn Capability>,
    creative: Arc<dyn Capability>,
    synthesizer: Arc<dyn Capability>,
}

impl SequentialPipeline {
    pub fn new(
        math: Arc<dyn Capability>,
        creative: Arc<dyn Capability>,
        synthesizer: Arc<dyn Capability>,
    ) -> Self {
        Self {
            math,
            creative,
            synthesizer,
        }
    }

    fn capability_for(&self, stage: Stage) -> Option<&Arc<dyn Capability>> {
        match stage {
            Stage::AwaitingMath => Some(&self.math),
            Stage::AwaitingCreative => Some(&self.creative),
            Stage::AwaitingSynthesis => Some(&self.synthesizer),
            Stage::Done => None,
        }
    }
}

#[async_trait]
impl Pipeline for SequentialPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Sequential
    }

    async fn run(&self, mut ctx: TurnContext) -> Result<RunReport, EngineError> {
        info!("Sequential run for session {}", ctx.session_id);

        let mut audit = AuditTrail::new();
        let mut outputs = Vec::new();
        let mut events = Vec::new();
        let mut stage = Stage::AwaitingMath;

        while let Some(capability) = self.capability_for(stage) {
            let name = capability.name().to_string();
            info!("Stage {:?}: invoking {}", stage, name);

            let output = match invoke_recorded(capability.as_ref(), &ctx, &mut audit).await {
                Ok(output) => output,
                Err(e) => {
                    error!("Stage {} failed: {}", name, e);
                    let err = e.into_engine_error(&name);
                    audit.log_aborted(&err);
                    return Err(err);
                }
            };

            let text = output.text();
            events.push(RunEvent::Message {
                author: name.clone(),
                text: text.clone(),
            });
            ctx.push(name.as_str(), text.as_str());
            outputs.push(StageOutput {
                capability: name,
                text,
            });
            stage = stage.next();
        }

        let final_response = outputs
            .last()
            .map(|o| o.text.clone())
            .unwrap_or_default();

        Ok(RunReport {
            outputs,
            events,
            audit,
            final_response,
        })
    }
}
