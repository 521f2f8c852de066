use serde::Deserialize;

/// What the chat channel reports to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The handshake completed.
    Connected,
    /// An incremental fragment of the assistant's reply.
    Chunk(String),
    /// The current exchange finished.
    Done,
    /// The service failed the current exchange.  The connection stays usable.
    Error(String),
}

impl StreamEvent {
    /// Returns true for the events that end an exchange.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error(_))
    }
}

/// The JSON shape of an inbound frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamFrame {
    /// Content fragment; empty on the terminal marker.
    #[serde(default)]
    pub chunk: Option<String>,
    /// True on the terminal marker.
    #[serde(default)]
    pub done: Option<bool>,
    /// Failure reported by the service.
    #[serde(default)]
    pub error: Option<String>,
}

impl StreamFrame {
    /// Translate the frame into an event.
    ///
    /// A `chunk` frame wins over an `error` field; a frame carrying neither
    /// produces no event.
    pub fn into_event(self) -> Option<StreamEvent> {
        match (self.chunk, self.error) {
            (Some(_), _) if self.done.unwrap_or(false) => Some(StreamEvent::Done),
            (Some(chunk), _) => Some(StreamEvent::Chunk(chunk)),
            (None, Some(error)) if !error.is_empty() => Some(StreamEvent::Error(error)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str) -> Option<StreamEvent> {
        serde_json::from_str::<StreamFrame>(text)
            .unwrap()
            .into_event()
    }

    #[test]
    fn chunk_frames() {
        assert_eq!(
            event(r#"{"chunk": "The word ", "done": false}"#),
            Some(StreamEvent::Chunk("The word ".to_string()))
        );
        assert_eq!(
            event(r#"{"chunk": "ἀγάπη"}"#),
            Some(StreamEvent::Chunk("ἀγάπη".to_string()))
        );
    }

    #[test]
    fn terminal_marker() {
        assert_eq!(
            event(r#"{"chunk": "", "done": true}"#),
            Some(StreamEvent::Done)
        );
    }

    #[test]
    fn error_frames() {
        assert_eq!(
            event(r#"{"error": "AI service error: timeout", "done": true}"#),
            Some(StreamEvent::Error("AI service error: timeout".to_string()))
        );
        assert!(StreamEvent::Error(String::new()).is_terminal());
    }

    #[test]
    fn frames_without_payload() {
        assert_eq!(event(r#"{}"#), None);
        assert_eq!(event(r#"{"done": true}"#), None);
        assert_eq!(event(r#"{"error": ""}"#), None);
        assert!(!StreamEvent::Chunk("x".to_string()).is_terminal());
    }
}
