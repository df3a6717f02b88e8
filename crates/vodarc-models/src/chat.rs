//! Chat messages, badges, emotes and pagination envelopes.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Normalized chat badge definition (global or channel scope).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Badge {
    /// Badge set name (e.g. "subscriber")
    pub name: String,
    /// Version within the set
    pub version: String,
    /// Badge title
    pub title: String,
    /// Image URL at 1x scale
    pub image_url_1x: String,
    /// Image URL at 2x scale
    pub image_url_2x: String,
    /// Image URL at 4x scale
    pub image_url_4x: String,
}

/// Normalized emote definition (global or channel scope).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Emote {
    /// Platform emote id
    pub id: String,
    /// Emote code typed in chat
    pub name: String,
    /// Image URL
    pub url: String,
    /// Image format (e.g. "static", "animated")
    pub format: String,
}

/// Badge worn by a chat message sender.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatBadge {
    /// Badge type (e.g. "moderator", "subscriber")
    #[serde(rename = "type")]
    pub kind: String,
    /// Display text
    pub text: String,
    /// Count for stacking badges (e.g. sub months)
    pub count: i64,
}

/// Chat identity of a sender: color and badges.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatIdentity {
    /// Username color as hex
    pub color: String,
    /// Badges worn by the sender
    pub badges: Vec<ChatBadge>,
}

/// Sender of a chat message.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatSender {
    /// Platform user id
    pub id: String,
    /// Login/slug
    pub slug: String,
    /// Display username
    pub username: String,
    /// Chat identity
    pub identity: ChatIdentity,
}

/// One chat message as written to the export artifact.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatMessage {
    /// Platform message id
    pub id: String,
    /// Id of the chatroom the message was posted in
    pub chat_id: String,
    /// Platform id of the sender
    pub user_id: String,
    /// Message text
    pub content: String,
    /// Message kind (e.g. "message", "reply")
    #[serde(rename = "type")]
    pub kind: String,
    /// Platform-specific extra data, passed through untouched
    pub metadata: serde_json::Value,
    /// Sender details
    pub sender: ChatSender,
    /// When the message was sent
    pub created_at: DateTime<Utc>,
}

/// One fetched page of chat history.
///
/// An empty `cursor` is the sole termination sentinel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ChatPage {
    /// Messages in arrival order
    pub messages: Vec<ChatMessage>,
    /// Cursor for the next page; empty when exhausted
    pub cursor: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_serializes_wire_field_names() {
        let msg = ChatMessage {
            id: "m1".to_string(),
            chat_id: "c1".to_string(),
            user_id: "u1".to_string(),
            content: "hello".to_string(),
            kind: "message".to_string(),
            metadata: serde_json::json!({}),
            sender: ChatSender {
                id: "u1".to_string(),
                slug: "viewer".to_string(),
                username: "Viewer".to_string(),
                identity: ChatIdentity {
                    color: "#ff0000".to_string(),
                    badges: vec![ChatBadge {
                        kind: "subscriber".to_string(),
                        text: "Subscriber".to_string(),
                        count: 3,
                    }],
                },
            },
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&msg).expect("serialize ChatMessage");
        assert_eq!(json["type"], "message");
        assert_eq!(json["sender"]["identity"]["badges"][0]["type"], "subscriber");
    }
}
