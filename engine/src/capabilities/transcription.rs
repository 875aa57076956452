//! Image transcription capability
//!
//! Transcribes text from the most recent image in the session. Images on the
//! current turn refresh the session's attachment cache; a turn without images
//! reuses the cached ones for this invocation only. With nothing cached, the
//! capability asks for an upload without calling the provider.

use super::creative::final_text;
use super::{Capability, CapabilityError, CapabilityKind, CapabilityOutput, TurnContext};
use crate::llm::{GenerateOptions, LLMProvider, Message};
use crate::session::attachments::{AttachmentCache, AttachmentSource};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const INSTRUCTIONS: &str = "You are an OCR specialist. Use the most recent image in the \
conversation. Transcribe every legible word, preserving line breaks where it helps \
readability. Answer in this structure:\nDetected Text:\n<verbatim transcription>\n\nNotes:\n\
<brief remarks about legibility, uncertainties or missing regions>\nNever invent text you \
cannot clearly see; if a region is unreadable, say so.";

/// Marker placed before reinjected images
pub const CARRIED_OVER_NOTE: &str = "Image previously uploaded for OCR transcription.";

/// Reply when no image is available anywhere in the session
pub const UPLOAD_REQUEST: &str =
    "I could not find an image in this conversation. Please upload the image you want transcribed.";

pub struct ImageTranscriptionCapability {
    provider: Arc<dyn LLMProvider>,
    cache: AttachmentCache,
    temperature: f64,
}

impl ImageTranscriptionCapability {
    pub fn new(provider: Arc<dyn LLMProvider>, cache: AttachmentCache, temperature: f64) -> Self {
        Self {
            provider,
            cache,
            temperature,
        }
    }
}

#[async_trait]
impl Capability for ImageTranscriptionCapability {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::ImageTranscription
    }

    async fn invoke(&self, ctx: &TurnContext) -> Result<CapabilityOutput, CapabilityError> {
        let mut messages = vec![Message::system(INSTRUCTIONS)];

        match self.cache.resolve(&ctx.session_id, ctx.image_attachments()) {
            AttachmentSource::CurrentTurn(images) => {
                debug!("Transcribing {} image(s) from the current turn", images.len());
                messages.push(Message::user_with_attachments(ctx.request.as_str(), images));
            }
            AttachmentSource::CarriedOver(images) => {
                info!(
                    "Reusing {} cached image(s) for session {}",
                    images.len(),
                    ctx.session_id
                );
                messages.push(Message::user(ctx.request.as_str()));
                messages.push(Message::user_with_attachments(CARRIED_OVER_NOTE, images));
            }
            AttachmentSource::Missing => {
                info!("No image available for session {}", ctx.session_id);
                return Ok(CapabilityOutput::Reply(UPLOAD_REQUEST.to_string()));
            }
        }

        let response = self
            .provider
            .generate(&messages, &GenerateOptions::new(self.temperature))
            .await?;
        Ok(CapabilityOutput::Reply(final_text(response)))
    }
}
