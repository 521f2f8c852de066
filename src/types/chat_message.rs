use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

use crate::types::ConversationMessage;
use crate::utils::time::{format_timestamp, parse_timestamp};

/// Who authored a chat message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person studying the text.
    User,
    /// The AI assistant.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the live buffer of a chat session.
///
/// The last assistant message grows in place while a response streams in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored the message.
    pub role: Role,
    /// The message text.
    pub content: String,
    /// When the message was created, if known.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::utils::time::option"
    )]
    pub timestamp: Option<OffsetDateTime>,
}

impl ChatMessage {
    /// Create a message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Some(OffsetDateTime::now_utc()),
        }
    }

    /// Create a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message stamped with the current time.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Convert to the persisted form, rendering the timestamp as RFC 3339.
    pub fn to_stored(&self) -> ConversationMessage {
        ConversationMessage {
            role: self.role,
            content: self.content.clone(),
            timestamp: self
                .timestamp
                .as_ref()
                .and_then(|ts| format_timestamp(ts).ok()),
        }
    }

    /// Convert from the persisted form.
    ///
    /// A timestamp that does not parse is dropped rather than failing the
    /// whole conversation.
    pub fn from_stored(stored: &ConversationMessage) -> Self {
        let timestamp = stored.timestamp.as_deref().and_then(|ts| {
            parse_timestamp(ts)
                .map_err(|err| tracing::warn!(timestamp = ts, error = %err, "dropping timestamp"))
                .ok()
        });
        Self {
            role: stored.role,
            content: stored.content.clone(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};
    use time::macros::datetime;

    #[test]
    fn role_serialization() {
        assert_eq!(to_value(Role::User).unwrap(), json!("user"));
        assert_eq!(to_value(Role::Assistant).unwrap(), json!("assistant"));
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn stored_round_trip_is_lossless() {
        let original = ChatMessage {
            role: Role::User,
            content: "What does ἀγάπη mean here?".to_string(),
            timestamp: Some(datetime!(2026-10-14 08:15:42.987654321 UTC)),
        };
        let stored = original.to_stored();
        assert_eq!(
            stored.timestamp.as_deref(),
            Some("2026-10-14T08:15:42.987654321Z")
        );
        assert_eq!(ChatMessage::from_stored(&stored), original);
    }

    #[test]
    fn now_stamped_round_trip() {
        let original = ChatMessage::assistant("Agape denotes self-giving love.");
        assert_eq!(ChatMessage::from_stored(&original.to_stored()), original);
    }

    #[test]
    fn missing_and_invalid_timestamps() {
        let stored = ConversationMessage {
            role: Role::Assistant,
            content: "text".to_string(),
            timestamp: None,
        };
        assert!(ChatMessage::from_stored(&stored).timestamp.is_none());

        let stored = ConversationMessage {
            timestamp: Some("not a time".to_string()),
            ..stored
        };
        let message = ChatMessage::from_stored(&stored);
        assert!(message.timestamp.is_none());
        assert_eq!(message.content, "text");
    }

    #[test]
    fn serde_uses_rfc3339() {
        let message = ChatMessage {
            role: Role::User,
            content: "hi".to_string(),
            timestamp: Some(datetime!(2026-01-30 12:00:00 UTC)),
        };
        assert_eq!(
            to_value(&message).unwrap(),
            json!({"role": "user", "content": "hi", "timestamp": "2026-01-30T12:00:00Z"})
        );
        let back: ChatMessage =
            serde_json::from_value(json!({"role": "assistant", "content": "x"})).unwrap();
        assert!(back.timestamp.is_none());
    }
}
