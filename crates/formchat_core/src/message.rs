use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, creation-time-unique message identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One chat entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: MessageId,
    text: String,
    is_user: bool,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_user(&self) -> bool {
        self.is_user
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Append-only, insertion-ordered log of chat messages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageStore {
    entries: Vec<Message>,
    index: HashMap<MessageId, usize>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new message and returns its id.
    ///
    /// Timestamps never go backwards: a stamp older than the last entry is
    /// raised to the last entry's stamp.
    pub fn append(&mut self, text: impl Into<String>, is_user: bool, at: DateTime<Utc>) -> MessageId {
        let id = MessageId::generate();
        self.push(Message {
            id: id.clone(),
            text: text.into(),
            is_user,
            timestamp: at,
        });
        id
    }

    /// Re-inserts a previously created message (cache restore). Returns false
    /// when the id is already present. The stamp is clamped like [`Self::append`].
    pub fn restore(&mut self, message: Message) -> bool {
        if self.index.contains_key(&message.id) {
            return false;
        }
        self.push(message);
        true
    }

    fn push(&mut self, mut message: Message) {
        if let Some(last) = self.entries.last() {
            message.timestamp = message.timestamp.max(last.timestamp);
        }
        self.index.insert(message.id.clone(), self.entries.len());
        self.entries.push(message);
    }

    pub fn all(&self) -> &[Message] {
        &self.entries
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}
