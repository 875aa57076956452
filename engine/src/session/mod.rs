//! Sessions, turns and per-session state
//!
//! A session is an ordered list of turns; each turn is an ordered list of
//! content parts (text or a typed binary attachment). Sessions and their state
//! belong to the persistence collaborator: the core only borrows them for the
//! duration of one turn. [`SessionService`] is the in-memory implementation
//! used by the CLI and the tests.

pub mod attachments;
pub mod state;

pub use attachments::AttachmentCache;
pub use state::{ConversationStateStore, InMemoryStateStore};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Typed binary attachment; the mime type decides whether it is an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(with = "base64_payload")]
    pub payload: Vec<u8>,
}

impl Attachment {
    pub fn new(mime_type: Option<&str>, payload: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.map(str::to_string),
            payload,
        }
    }

    /// Untyped attachments are treated as images.
    pub fn is_image(&self) -> bool {
        match self.mime_type.as_deref() {
            None | Some("") => true,
            Some(mime) => mime.starts_with("image"),
        }
    }
}

mod base64_payload {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// One part of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Attachment(Attachment),
}

/// One conversational turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub author: String,
    pub parts: Vec<ContentPart>,
}

impl Turn {
    pub fn new(author: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            author: author.into(),
            parts,
        }
    }

    /// A user turn holding a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new("user", vec![ContentPart::Text { text: text.into() }])
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.parts.push(ContentPart::Attachment(attachment));
        self
    }

    /// Text parts joined with newlines
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::Attachment(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.parts.iter().filter_map(|part| match part {
            ContentPart::Attachment(a) => Some(a),
            ContentPart::Text { .. } => None,
        })
    }

    pub fn image_attachments(&self) -> Vec<Attachment> {
        self.attachments().filter(|a| a.is_image()).cloned().collect()
    }
}

/// A persistent conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub turns: Vec<Turn>,
}

/// In-memory session service
///
/// Holds sessions and the per-session state store. Sessions are keyed by id;
/// nothing is persisted beyond the process lifetime.
#[derive(Clone, Default)]
pub struct SessionService {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    state: Arc<InMemoryStateStore>,
}

impl SessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session, or return the existing one with the same id
    pub fn create_session(&self, user_id: &str, session_id: &str) -> Session {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session {
                id: session_id.to_string(),
                user_id: user_id.to_string(),
                turns: Vec::new(),
            })
            .clone()
    }

    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(session_id).cloned()
    }

    /// Append a turn; returns false if the session does not exist
    pub fn append_turn(&self, session_id: &str, turn: Turn) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        match sessions.get_mut(session_id) {
            Some(session) => {
                session.turns.push(turn);
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> Arc<InMemoryStateStore> {
        Arc::clone(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_detection() {
        assert!(Attachment::new(Some("image/png"), vec![]).is_image());
        assert!(Attachment::new(None, vec![]).is_image());
        assert!(Attachment::new(Some(""), vec![]).is_image());
        assert!(!Attachment::new(Some("application/pdf"), vec![]).is_image());
    }

    #[test]
    fn test_attachment_payload_serializes_as_base64() {
        let attachment = Attachment::new(Some("image/png"), b"hello".to_vec());
        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["payload"], "aGVsbG8=");
        let back: Attachment = serde_json::from_value(json).unwrap();
        assert_eq!(back, attachment);
    }

    #[test]
    fn test_turn_text_and_images() {
        let turn = Turn::user_text("read this")
            .with_attachment(Attachment::new(Some("image/png"), vec![1]))
            .with_attachment(Attachment::new(Some("text/plain"), vec![2]));
        assert_eq!(turn.text(), "read this");
        assert_eq!(turn.attachments().count(), 2);
        assert_eq!(turn.image_attachments().len(), 1);
    }

    #[test]
    fn test_session_service_lifecycle() {
        let service = SessionService::new();
        service.create_session("alice", "s1");
        assert!(service.append_turn("s1", Turn::user_text("hi")));
        assert!(!service.append_turn("missing", Turn::user_text("hi")));

        let again = service.create_session("alice", "s1");
        assert_eq!(again.turns.len(), 1);
        assert_eq!(service.get_session("s1").unwrap().user_id, "alice");
    }
}
