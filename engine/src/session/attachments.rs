//! Single-slot attachment cache
//!
//! Holds the most recent generation of image attachments seen in a session.
//! A turn that carries images overwrites the slot; a turn without images reads
//! it without mutating it.

use super::state::ConversationStateStore;
use super::Attachment;
use std::sync::Arc;
use tracing::{debug, warn};

/// State key under which the latest attachments are stored
pub const STATE_KEY: &str = "ocr_latest_image_parts";

/// Where the attachments used for a turn came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Attached to the current turn
    CurrentTurn(Vec<Attachment>),

    /// Reinjected from the cache for this turn only
    CarriedOver(Vec<Attachment>),

    /// Nothing attached and nothing cached
    Missing,
}

#[derive(Clone)]
pub struct AttachmentCache {
    store: Arc<dyn ConversationStateStore>,
}

impl AttachmentCache {
    pub fn new(store: Arc<dyn ConversationStateStore>) -> Self {
        Self { store }
    }

    /// Replace the cached generation for a session
    pub fn refresh(&self, session_id: &str, attachments: &[Attachment]) {
        match serde_json::to_value(attachments) {
            Ok(value) => {
                debug!(
                    "Caching {} attachment(s) for session {}",
                    attachments.len(),
                    session_id
                );
                self.store.set(session_id, STATE_KEY, value);
            }
            Err(e) => warn!("Failed to serialize attachments for cache: {}", e),
        }
    }

    /// Read the cached generation without mutating it
    pub fn load(&self, session_id: &str) -> Option<Vec<Attachment>> {
        let value = self.store.get(session_id, STATE_KEY)?;
        match serde_json::from_value::<Vec<Attachment>>(value) {
            Ok(attachments) if !attachments.is_empty() => Some(attachments),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring unreadable attachment cache for {}: {}", session_id, e);
                None
            }
        }
    }

    /// Decide which attachments a turn should use
    pub fn resolve(&self, session_id: &str, current: Vec<Attachment>) -> AttachmentSource {
        if !current.is_empty() {
            self.refresh(session_id, &current);
            return AttachmentSource::CurrentTurn(current);
        }
        match self.load(session_id) {
            Some(cached) => AttachmentSource::CarriedOver(cached),
            None => AttachmentSource::Missing,
        }
    }
}
