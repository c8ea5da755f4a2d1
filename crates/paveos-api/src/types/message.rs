//! Lead conversation messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::Pagination;

/// Whether a message was received from the lead or sent by the creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    Incoming,
    Outgoing,
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAttachment {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// One message in a lead conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,

    /// Owning lead. The history endpoint omits it; realtime events carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,

    #[serde(default)]
    pub content: String,

    pub direction: MessageDirection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,

    #[serde(default)]
    pub is_read: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<MessageAttachment>,

    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Incoming and not yet read.
    pub fn is_unread_incoming(&self) -> bool {
        self.direction == MessageDirection::Incoming && !self.is_read
    }
}

/// Filters for `GET /integrations/discord/messages`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// One page of messages.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub pagination: Pagination,
}

/// Outgoing message request (`POST /integrations/discord/send-message`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_user_id: Option<String>,
    pub content: String,
}

impl SendMessage {
    /// Direct message to a Discord user.
    pub fn direct(discord_user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            channel_id: None,
            discord_user_id: Some(discord_user_id.into()),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_deserialize_ignores_platform_fields() {
        let msg: Message = serde_json::from_str(
            r#"{
                "id": "m1",
                "leadId": "L1",
                "discordChannelId": "c1",
                "discordMessageId": "dm1",
                "content": "hello",
                "direction": "incoming",
                "authorUsername": "ada",
                "isRead": false,
                "attachments": [{"url": "https://cdn/x.png", "filename": "x.png", "size": 10, "contentType": "image/png"}],
                "createdAt": "2024-05-01T10:00:00.000Z"
            }"#,
        )
        .unwrap();
        assert_eq!(msg.lead_id.as_deref(), Some("L1"));
        assert!(msg.is_unread_incoming());
        assert_eq!(msg.attachments[0].filename, "x.png");
    }

    #[test]
    fn test_send_message_direct() {
        let body = serde_json::to_value(SendMessage::direct("123", "hi")).unwrap();
        assert_eq!(body, serde_json::json!({ "discordUserId": "123", "content": "hi" }));
    }
}
