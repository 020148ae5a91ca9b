use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{null_default, Document};
use crate::types::DocId;

/// A `chats/{chatId}` room between exactly two users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRoom {
    #[serde(skip)]
    pub id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub participants: Vec<DocId>,
    /// Display names denormalized onto the room, keyed by uid.
    #[serde(deserialize_with = "null_default")]
    pub participant_names: HashMap<DocId, String>,
}

impl ChatRoom {
    /// The participant who is not `uid`.
    pub fn other_participant(&self, uid: &str) -> Option<&str> {
        self.participants
            .iter()
            .map(String::as_str)
            .find(|p| *p != uid)
    }

    pub fn name_of(&self, uid: &str) -> Option<&str> {
        self.participant_names
            .get(uid)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
    }
}

impl Document for ChatRoom {
    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

/// A `chats/{chatId}/messages/{messageId}` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatMessage {
    #[serde(skip)]
    pub id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub sender_id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub text: String,
}

impl Document for ChatMessage {
    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}
