//! Tool-driven pipeline
//!
//! A reasoning controller is invoked repeatedly. Each round it either calls a
//! capability as a tool or delegates to the synthesizer, which ends the run.
//!
//! The pipeline enforces ordering only: `poetry_agent` is refused until a
//! `math_agent` call has succeeded in this run. Refusals and capability
//! failures are returned to the controller as tool results; what to do next
//! is the controller's decision. A run that never delegates is abandoned after
//! `max_rounds` controller decisions.

use super::{invoke_recorded, AuditTrail, Pipeline, PipelineKind, RunEvent, RunReport, StageOutput};
use crate::capabilities::controller::TRANSFER_TOOL;
use crate::capabilities::{Capability, CapabilityKind, CapabilityOutput, ToolExchange, TurnContext};
use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::{FailurePayload, ToolRequest, ToolResponse};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Controller progress within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    MathInvoked { succeeded: bool },
    PoetryInvoked,
    Delegated,
}

impl ControllerState {
    /// Poetry requires a successful math result earlier in the run
    pub fn allows_poetry(&self) -> bool {
        matches!(
            self,
            ControllerState::MathInvoked { succeeded: true } | ControllerState::PoetryInvoked
        )
    }
}

pub struct ToolDrivenPipeline {
    controller: Arc<dyn Capability>,
    math: Arc<dyn Capability>,
    poetry: Arc<dyn Capability>,
    synthesizer: Arc<dyn Capability>,
    max_rounds: usize,
}

/// Mutable bookkeeping for one run
struct RunState {
    ctx: TurnContext,
    audit: AuditTrail,
    events: Vec<RunEvent>,
    outputs: Vec<StageOutput>,
    state: ControllerState,
}

fn rejection(kind: &str, message: impl Into<String>) -> Value {
    FailurePayload::new(kind, None, message).to_value()
}

impl ToolDrivenPipeline {
    pub fn new(
        controller: Arc<dyn Capability>,
        math: Arc<dyn Capability>,
        poetry: Arc<dyn Capability>,
        synthesizer: Arc<dyn Capability>,
        max_rounds: usize,
    ) -> Self {
        Self {
            controller,
            math,
            poetry,
            synthesizer,
            max_rounds,
        }
    }

    /// Invoke a capability on behalf of the controller; failures become data
    async fn call_capability(
        &self,
        capability: &dyn Capability,
        request: &ToolRequest,
        run: &mut RunState,
    ) -> (ToolResponse, bool) {
        let argument = match request.arg_str("request") {
            Ok(text) => text.to_string(),
            Err(e) => {
                return (
                    ToolResponse::json(&request.name, rejection("ValidationError", e.to_string())),
                    false,
                )
            }
        };

        let sub_ctx = run.ctx.for_tool(argument);
        match invoke_recorded(capability, &sub_ctx, &mut run.audit).await {
            Ok(output) => {
                let text = output.text();
                run.ctx.push(capability.name(), text.as_str());
                run.outputs.push(StageOutput {
                    capability: capability.name().to_string(),
                    text: text.clone(),
                });
                (ToolResponse::text(&request.name, text), true)
            }
            Err(e) => {
                info!("{} failed; returning the failure to the controller", capability.name());
                (ToolResponse::json(&request.name, e.payload()), false)
            }
        }
    }

    /// Handle one tool call; returns true when the controller delegated
    async fn handle_tool_call(&self, request: ToolRequest, run: &mut RunState) -> bool {
        run.events.push(RunEvent::ToolCall {
            name: request.name.clone(),
            args: Value::Object(request.arguments.clone()),
        });

        let math_name = CapabilityKind::Math.agent_name();
        let poetry_name = CapabilityKind::CreativeWriting.agent_name();
        let synthesizer_name = CapabilityKind::Synthesizer.agent_name();
        let mut delegated = false;

        let response = if request.name == math_name {
            let (response, succeeded) =
                self.call_capability(self.math.as_ref(), &request, run).await;
            run.state = ControllerState::MathInvoked { succeeded };
            response
        } else if request.name == poetry_name {
            if run.state.allows_poetry() {
                let (response, succeeded) =
                    self.call_capability(self.poetry.as_ref(), &request, run).await;
                if succeeded {
                    run.state = ControllerState::PoetryInvoked;
                }
                response
            } else {
                warn!("Rejected poetry_agent call before a successful math result");
                ToolResponse::json(
                    &request.name,
                    rejection(
                        "OrderingViolation",
                        "poetry_agent may only be called after math_agent has succeeded.",
                    ),
                )
            }
        } else if request.name == TRANSFER_TOOL {
            match request.arg_str_opt("agent_name") {
                Some(target) if target == synthesizer_name => {
                    delegated = true;
                    ToolResponse::json(&request.name, json!({ "transferred_to": target }))
                }
                other => {
                    warn!("Rejected transfer to {:?}", other);
                    ToolResponse::json(
                        &request.name,
                        rejection(
                            "UnknownAgent",
                            format!("Transfers are only allowed to {}.", synthesizer_name),
                        ),
                    )
                }
            }
        } else {
            warn!("Rejected unknown tool '{}'", request.name);
            ToolResponse::json(
                &request.name,
                rejection("UnknownTool", format!("Unknown tool: {}", request.name)),
            )
        };

        run.events.push(RunEvent::ToolResponse {
            name: response.name.clone(),
            response: response.response.clone(),
        });
        let call_id = format!("call_{}", run.ctx.exchanges.len() + 1);
        run.ctx.exchanges.push(ToolExchange {
            call_id,
            request,
            response,
        });
        delegated
    }
}

#[async_trait]
impl Pipeline for ToolDrivenPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::ToolDriven
    }

    async fn run(&self, ctx: TurnContext) -> Result<RunReport, EngineError> {
        info!("Tool-driven run for session {}", ctx.session_id);

        let mut run = RunState {
            ctx,
            audit: AuditTrail::new(),
            events: Vec::new(),
            outputs: Vec::new(),
            state: ControllerState::Idle,
        };
        let controller_name = self.controller.name().to_string();

        for round in 1..=self.max_rounds {
            debug!("Controller round {}/{} ({:?})", round, self.max_rounds, run.state);

            let output = match invoke_recorded(self.controller.as_ref(), &run.ctx, &mut run.audit)
                .await
            {
                Ok(output) => output,
                Err(e) => {
                    error!("Controller failed: {}", e);
                    let err = e.into_engine_error(&controller_name);
                    run.audit.log_aborted(&err);
                    return Err(err);
                }
            };

            match output {
                CapabilityOutput::ToolCall(request) => {
                    if self.handle_tool_call(request, &mut run).await {
                        run.state = ControllerState::Delegated;
                    }
                }
                CapabilityOutput::Delegate { note } | CapabilityOutput::Reply(note) => {
                    if !note.trim().is_empty() {
                        debug!("Controller note: {}", note);
                        run.ctx.push(controller_name.as_str(), note);
                    }
                    run.state = ControllerState::Delegated;
                }
            }

            if run.state == ControllerState::Delegated {
                return self.synthesize(run).await;
            }
        }

        error!("Controller did not delegate within {} rounds", self.max_rounds);
        let err = EngineError::MaxRoundsExceeded(self.max_rounds);
        run.audit.log_aborted(&err);
        Err(err)
    }
}

impl ToolDrivenPipeline {
    async fn synthesize(&self, mut run: RunState) -> Result<RunReport, EngineError> {
        let name = self.synthesizer.name().to_string();
        info!("Delegating to {}", name);

        let output = match invoke_recorded(self.synthesizer.as_ref(), &run.ctx, &mut run.audit)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                let err = e.into_engine_error(&name);
                run.audit.log_aborted(&err);
                return Err(err);
            }
        };

        let final_response = output.text();
        run.events.push(RunEvent::Message {
            author: name.clone(),
            text: final_response.clone(),
        });
        run.outputs.push(StageOutput {
            capability: name,
            text: final_response.clone(),
        });

        Ok(RunReport {
            outputs: run.outputs,
            events: run.events,
            audit: run.audit,
            final_response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poetry_gate() {
        assert!(!ControllerState::Idle.allows_poetry());
        assert!(!ControllerState::MathInvoked { succeeded: false }.allows_poetry());
        assert!(ControllerState::MathInvoked { succeeded: true }.allows_poetry());
        assert!(ControllerState::PoetryInvoked.allows_poetry());
        assert!(!ControllerState::Delegated.allows_poetry());
    }
}
