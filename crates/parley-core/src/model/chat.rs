//! Chat and message models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChatId, MessageId, UserId};

/// Kind of chat thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum ChatType {
    /// Exactly two participants.
    Direct,
    /// Stored but not served by the real-time core.
    Group,
}

/// A participant of a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecipient {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

/// A chat thread as delivered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub chat_type: ChatType,
    pub recipients: Vec<ChatRecipient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<MessageId>,
}

impl Chat {
    /// Build a new direct chat between two users.
    pub fn direct(a: UserId, b: UserId) -> Self {
        Self {
            id: ChatId::new(),
            name: None,
            chat_type: ChatType::Direct,
            recipients: vec![
                ChatRecipient { id: a, nickname: None },
                ChatRecipient { id: b, nickname: None },
            ],
            last_message_id: None,
        }
    }

    pub fn is_direct(&self) -> bool {
        self.chat_type == ChatType::Direct
    }

    pub fn has_recipient(&self, user: UserId) -> bool {
        self.recipients.iter().any(|r| r.id == user)
    }

    /// Participants other than `user`.
    pub fn other_recipients(&self, user: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.recipients
            .iter()
            .map(|r| r.id)
            .filter(move |id| *id != user)
    }

    /// Ids of all participants.
    pub fn recipient_ids(&self) -> Vec<UserId> {
        self.recipients.iter().map(|r| r.id).collect()
    }
}

/// A stored chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_serializes_camel_case() {
        let chat = Chat::direct(UserId::new(), UserId::new());
        let json = serde_json::to_value(&chat).unwrap();
        assert_eq!(json["chatType"], "Direct");
        assert!(json.get("lastMessageId").is_none());
        assert_eq!(json["recipients"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_other_recipients_excludes_self() {
        let me = UserId::new();
        let peer = UserId::new();
        let chat = Chat::direct(me, peer);
        assert_eq!(chat.other_recipients(me).collect::<Vec<_>>(), vec![peer]);
        assert!(chat.has_recipient(peer));
        assert!(!chat.has_recipient(UserId::new()));
    }
}
