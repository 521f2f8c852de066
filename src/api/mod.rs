//! Typed wrappers over [`ApiClient`](crate::client::ApiClient), one per
//! resource family of the study service.

mod auth;
mod conversations;
mod lexicon;
mod verses;

use serde_json::Value;

use crate::client::{ApiClient, RequestOptions};
use crate::error::Result;

pub use auth::AuthApi;
pub use conversations::{ConversationApi, ConversationStore, DEFAULT_LIMIT};
pub use lexicon::{LexiconApi, is_strongs_number};
pub use verses::VerseApi;

/// Describe the AI provider behind the chat endpoint.
pub async fn chat_info(client: &ApiClient) -> Result<Value> {
    client.get("/chat/info", RequestOptions::new()).await
}
