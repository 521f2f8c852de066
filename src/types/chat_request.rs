use serde::Serialize;

/// One outbound question for the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// The user's question.
    pub message: String,
    /// The verse the question is about, e.g. `John 3:16`.
    pub verse_reference: Option<String>,
}

impl ChatRequest {
    /// Create a request with no verse context.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            verse_reference: None,
        }
    }

    /// Attach a verse reference.
    pub fn with_verse_reference(mut self, verse_reference: Option<String>) -> Self {
        self.verse_reference = verse_reference;
        self
    }
}

/// The frame written to the chat socket.
///
/// History is never replayed from the client and lexicon lookups are always
/// requested; the service derives context from the verse reference.
#[derive(Debug, Serialize)]
pub struct WireChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    verse_reference: Option<&'a str>,
    conversation_history: &'a [serde_json::Value],
    include_lexicon: bool,
}

impl<'a> From<&'a ChatRequest> for WireChatRequest<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        Self {
            message: &request.message,
            verse_reference: request.verse_reference.as_deref(),
            conversation_history: &[],
            include_lexicon: true,
        }
    }
}
