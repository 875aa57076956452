//! Per-session key/value state

use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Key/value cache scoped by session id
///
/// Values stored under one session are never visible under another.
pub trait ConversationStateStore: Send + Sync {
    fn get(&self, session_id: &str, key: &str) -> Option<Value>;

    /// Unconditional overwrite
    fn set(&self, session_id: &str, key: &str, value: Value);
}

#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    entries: RwLock<HashMap<(String, String), Value>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStateStore for InMemoryStateStore {
    fn get(&self, session_id: &str, key: &str) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&(session_id.to_string(), key.to_string()))
            .cloned()
    }

    fn set(&self, session_id: &str, key: &str, value: Value) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert((session_id.to_string(), key.to_string()), value);
    }
}
