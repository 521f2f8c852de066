mod chat_message;
mod chat_request;
mod conversation;
mod lexicon;
mod stream_event;
mod user;
mod verse;

pub use chat_message::{ChatMessage, Role};
pub use chat_request::{ChatRequest, WireChatRequest};
pub use conversation::{
    Conversation, ConversationCreate, ConversationId, ConversationListItem, ConversationMessage,
    ConversationUpdate, DEFAULT_TITLE, TITLE_LIMIT, derive_title,
};
pub use lexicon::{LexiconEntry, LexiconSearchResult};
pub use stream_event::{StreamEvent, StreamFrame};
pub use user::{AuthToken, MessageResponse, RegisterRequest, User};
pub use verse::{Book, Verse, VerseWord};
