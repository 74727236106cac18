use super::id::SessionId;
use super::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted conversation
///
/// `messages` is chronological (oldest first) and append-only: the
/// pipeline adds turns but never edits or removes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    #[serde(alias = "ID")]
    pub id: SessionId,

    /// Ordered conversation history
    #[serde(default)]
    pub messages: Vec<Message>,

    /// When the session was first persisted
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// When a turn was last appended
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Start a new conversation under a freshly generated id
    pub fn new() -> Self {
        Self::with_id(SessionId::generate())
    }

    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append one user/assistant exchange
    pub fn push_turn(&mut self, user: Message, assistant: Message) {
        self.messages.push(user);
        self.messages.push(assistant);
        self.updated_at = Utc::now();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
