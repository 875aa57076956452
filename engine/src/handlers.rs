//! Command handlers for CLI operations
//!
//! - run: process one turn through a pipeline and print its events
//! - transcribe: run image transcription for one turn
//! - eval: evaluate an expression locally, no credential required

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::capabilities::{Capability, ImageTranscriptionCapability, TurnContext};
use crate::config::Config;
use crate::evaluator;
use crate::llm::openai::OpenAIProvider;
use crate::llm::LLMProvider;
use crate::orchestrator::{build_pipeline, Pipeline, PipelineKind, RunEvent, RunReport};
use crate::session::{Attachment, AttachmentCache, ContentPart, SessionService, Turn};
use sdk::errors::EngineError;

/// Build the provider; fails when no credential is configured
fn provider(config: &Config) -> Result<Arc<dyn LLMProvider>, EngineError> {
    let api_key = config.api_key()?;
    info!("Using OpenAI model {}", config.llm.model);
    Ok(Arc::new(OpenAIProvider::new(&config.llm, api_key.clone())))
}

/// Process one user turn: record it, run the pipeline, record the reply
pub async fn run_turn(
    pipeline: &dyn Pipeline,
    sessions: &SessionService,
    session_id: &str,
    user_id: &str,
    turn: Turn,
) -> Result<RunReport, EngineError> {
    sessions.create_session(user_id, session_id);
    let request = turn.text();
    let attachments: Vec<Attachment> = turn.attachments().cloned().collect();
    sessions.append_turn(session_id, turn);

    let ctx = TurnContext::new(session_id, user_id, request).with_attachments(attachments);
    let report = pipeline.run(ctx).await?;

    if let Some(last) = report.outputs.last() {
        sessions.append_turn(
            session_id,
            Turn::new(
                last.capability.as_str(),
                vec![ContentPart::Text {
                    text: report.final_response.clone(),
                }],
            ),
        );
    }
    debug!(
        "Run finished with {} audit entries: {:?}",
        report.audit.len(),
        report.audit.capability_names()
    );
    Ok(report)
}

fn print_events(events: &[RunEvent]) {
    for event in events {
        println!("{}", event.render());
    }
}

/// Execute the orchestrator for a single prompt
pub async fn handle_run(
    prompt: String,
    session_id: &str,
    user_id: &str,
    pipeline: Option<PipelineKind>,
    config: &Config,
) -> Result<()> {
    let kind = pipeline.unwrap_or(config.pipeline.default);
    let pipeline = build_pipeline(kind, config, provider(config)?);
    info!("Running {} pipeline for session {}", kind, session_id);

    let sessions = SessionService::new();
    let report = run_turn(
        pipeline.as_ref(),
        &sessions,
        session_id,
        user_id,
        Turn::user_text(prompt),
    )
    .await?;

    print_events(&report.events);
    Ok(())
}

/// Guess an attachment mime type from the file extension
fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

/// Read files as attachments
pub fn load_attachments(paths: &[PathBuf]) -> Result<Vec<Attachment>> {
    paths
        .iter()
        .map(|path| {
            let payload = std::fs::read(path)
                .with_context(|| format!("Failed to read attachment {}", path.display()))?;
            Ok(Attachment::new(mime_for(path), payload))
        })
        .collect()
}

/// Transcribe text from images for a single prompt
pub async fn handle_transcribe(
    prompt: String,
    session_id: &str,
    user_id: &str,
    images: &[PathBuf],
    config: &Config,
) -> Result<()> {
    let attachments = load_attachments(images)?;
    let sessions = SessionService::new();
    sessions.create_session(user_id, session_id);

    let cache = AttachmentCache::new(sessions.state());
    let capability =
        ImageTranscriptionCapability::new(provider(config)?, cache, config.llm.temperature);

    let ctx = TurnContext::new(session_id, user_id, prompt).with_attachments(attachments);
    let output = capability
        .invoke(&ctx)
        .await
        .map_err(|e| e.into_engine_error(capability.name()))?;

    print_events(&[RunEvent::Message {
        author: capability.name().to_string(),
        text: output.text(),
    }]);
    Ok(())
}

/// Evaluate an expression and print the tool payload as JSON
pub fn handle_eval(expression: String) -> Result<()> {
    match evaluator::evaluate(&expression) {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result.to_payload())?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.to_payload())?);
            Err(EngineError::from(e).into())
        }
    }
}
