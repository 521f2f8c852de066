use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Identifier assigned by the persistence store.
pub type ConversationId = i64;

/// Title used when a conversation has no user message to name it after.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Longest title derived from a message, in characters.
pub const TITLE_LIMIT: usize = 50;

/// A message as the persistence store keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Who authored the message.
    pub role: Role,
    /// The message text.
    pub content: String,
    /// ISO 8601 timestamp, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// A saved conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Store-assigned identifier.
    pub id: ConversationId,
    /// Owner of the conversation.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Title, if one was set or derived.
    #[serde(default)]
    pub title: Option<String>,
    /// The ordered messages.
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
    /// When the conversation was created.
    pub created_at: String,
    /// When the conversation was last changed.
    pub updated_at: String,
}

/// Summary row returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationListItem {
    /// Store-assigned identifier.
    pub id: ConversationId,
    /// Title, if any.
    #[serde(default)]
    pub title: Option<String>,
    /// Number of stored messages.
    #[serde(default)]
    pub message_count: u64,
    /// When the conversation was created.
    pub created_at: String,
    /// When the conversation was last changed.
    pub updated_at: String,
}

/// Body of a create call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationCreate {
    /// Title; the store may derive one when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Initial messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ConversationMessage>>,
}

/// Body of an update call.  Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationUpdate {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replacement message list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ConversationMessage>>,
}

impl ConversationCreate {
    /// Build a create call whose title comes from the first user message.
    pub fn from_messages(messages: Vec<ConversationMessage>) -> Self {
        Self {
            title: Some(derive_title(&messages)),
            messages: Some(messages),
        }
    }
}

impl ConversationUpdate {
    /// Build an update that replaces the message list.
    pub fn messages(messages: Vec<ConversationMessage>) -> Self {
        Self {
            title: None,
            messages: Some(messages),
        }
    }
}

/// Name a conversation after its first user message.
///
/// Titles longer than [`TITLE_LIMIT`] characters are cut and marked with
/// `...`.
pub fn derive_title(messages: &[ConversationMessage]) -> String {
    let Some(first) = messages.iter().find(|m| m.role == Role::User) else {
        return DEFAULT_TITLE.to_string();
    };
    let mut chars = first.content.chars();
    let mut title: String = chars.by_ref().take(TITLE_LIMIT).collect();
    if chars.next().is_some() {
        title.push_str("...");
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    fn message(role: Role, content: &str) -> ConversationMessage {
        ConversationMessage {
            role,
            content: content.to_string(),
            timestamp: None,
        }
    }

    #[test]
    fn title_from_first_user_message() {
        let messages = vec![
            message(Role::Assistant, "Welcome"),
            message(Role::User, "What does λόγος mean in John 1:1?"),
            message(Role::User, "second"),
        ];
        assert_eq!(derive_title(&messages), "What does λόγος mean in John 1:1?");
    }

    #[test]
    fn long_title_is_truncated() {
        let long = "α".repeat(60);
        let title = derive_title(&[message(Role::User, &long)]);
        assert_eq!(title, format!("{}...", "α".repeat(50)));

        let exact = "β".repeat(50);
        assert_eq!(derive_title(&[message(Role::User, &exact)]), exact);
    }

    #[test]
    fn default_title_without_user_message() {
        assert_eq!(derive_title(&[]), DEFAULT_TITLE);
        assert_eq!(
            derive_title(&[message(Role::Assistant, "hello")]),
            DEFAULT_TITLE
        );
    }

    #[test]
    fn update_skips_absent_fields() {
        let update = ConversationUpdate::messages(vec![message(Role::User, "hi")]);
        assert_eq!(
            to_value(&update).unwrap(),
            json!({"messages": [{"role": "user", "content": "hi"}]})
        );
        assert_eq!(to_value(ConversationCreate::default()).unwrap(), json!({}));
    }

    #[test]
    fn conversation_deserialization() {
        let conversation: Conversation = serde_json::from_value(json!({
            "id": 7,
            "user_id": 1,
            "title": null,
            "messages": [
                {"role": "user", "content": "hi", "timestamp": "2026-01-30T12:00:00.000Z"}
            ],
            "created_at": "2026-01-30T12:00:00",
            "updated_at": "2026-01-30T12:00:01"
        }))
        .unwrap();
        assert_eq!(conversation.id, 7);
        assert!(conversation.title.is_none());
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(
            conversation.messages[0].timestamp.as_deref(),
            Some("2026-01-30T12:00:00.000Z")
        );
    }
}
