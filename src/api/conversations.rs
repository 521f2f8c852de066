use crate::client::{ApiClient, RequestOptions};
use crate::error::Result;
use crate::types::{
    Conversation, ConversationCreate, ConversationId, ConversationListItem, ConversationMessage,
    ConversationUpdate, Role,
};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_LIMIT: u64 = 50;

/// Where chat sessions persist their conversations.
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    /// List summaries, newest first as ordered by the store.
    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<ConversationListItem>>;
    /// Fetch one conversation with all of its messages.
    async fn get(&self, id: ConversationId) -> Result<Conversation>;
    /// Create a conversation.
    async fn create(&self, data: &ConversationCreate) -> Result<Conversation>;
    /// Update a conversation; absent fields are left unchanged.
    async fn update(&self, id: ConversationId, data: &ConversationUpdate) -> Result<Conversation>;
    /// Delete a conversation.
    async fn delete(&self, id: ConversationId) -> Result<()>;
}

/// The REST-backed conversation store.
#[derive(Clone, Debug)]
pub struct ConversationApi {
    client: ApiClient,
}

impl ConversationApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Append one message without resending the rest of the conversation.
    pub async fn append_message(
        &self,
        id: ConversationId,
        role: Role,
        content: &str,
    ) -> Result<Conversation> {
        let options = RequestOptions::new()
            .with_query("role", role)
            .with_query("content", content);
        self.client
            .post_empty(&format!("/conversations/{id}/messages"), options)
            .await
    }

    /// Create a conversation titled after its first user message.
    pub async fn create_from_messages(
        &self,
        messages: Vec<ConversationMessage>,
    ) -> Result<Conversation> {
        self.create(&ConversationCreate::from_messages(messages))
            .await
    }
}

#[async_trait::async_trait]
impl ConversationStore for ConversationApi {
    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<ConversationListItem>> {
        let options = RequestOptions::new()
            .with_query("skip", skip)
            .with_query("limit", limit);
        self.client.get("/conversations", options).await
    }

    async fn get(&self, id: ConversationId) -> Result<Conversation> {
        self.client
            .get(&format!("/conversations/{id}"), RequestOptions::new())
            .await
    }

    async fn create(&self, data: &ConversationCreate) -> Result<Conversation> {
        self.client
            .post("/conversations", data, RequestOptions::new())
            .await
    }

    async fn update(&self, id: ConversationId, data: &ConversationUpdate) -> Result<Conversation> {
        self.client
            .put(&format!("/conversations/{id}"), data, RequestOptions::new())
            .await
    }

    async fn delete(&self, id: ConversationId) -> Result<()> {
        self.client
            .delete(&format!("/conversations/{id}"), RequestOptions::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::credentials::SessionContext;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn conversation(id: ConversationId, title: &str) -> Value {
        json!({
            "id": id,
            "user_id": 1,
            "title": title,
            "messages": [{"role": "user", "content": "hi"}],
            "created_at": "2026-01-30T12:00:00",
            "updated_at": "2026-01-30T12:00:00"
        })
    }

    fn api_for(server: &MockServer) -> ConversationApi {
        let config = ClientConfig::new().with_api_url(&server.uri()).unwrap();
        ConversationApi::new(ApiClient::new(&config, SessionContext::with_token("t")).unwrap())
    }

    #[tokio::test]
    async fn list_passes_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversations"))
            .and(query_param("skip", "0"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 4,
                "title": "Logos",
                "message_count": 2,
                "created_at": "2026-01-30T12:00:00",
                "updated_at": "2026-01-30T12:00:00"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let items = api_for(&server).list(0, DEFAULT_LIMIT).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].message_count, 2);
    }

    #[tokio::test]
    async fn create_from_messages_derives_title() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/conversations"))
            .and(body_json(json!({
                "title": "hi",
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(conversation(9, "hi")))
            .expect(1)
            .mount(&server)
            .await;

        let created = api_for(&server)
            .create_from_messages(vec![ConversationMessage {
                role: Role::User,
                content: "hi".to_string(),
                timestamp: None,
            }])
            .await
            .unwrap();
        assert_eq!(created.id, 9);
    }

    #[tokio::test]
    async fn update_uses_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/conversations/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(conversation(9, "hi")))
            .expect(1)
            .mount(&server)
            .await;

        let updated = api_for(&server)
            .update(9, &ConversationUpdate::messages(vec![]))
            .await
            .unwrap();
        assert_eq!(updated.title.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn append_message_uses_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/conversations/9/messages"))
            .and(query_param("role", "assistant"))
            .and(query_param("content", "Χάρις"))
            .respond_with(ResponseTemplate::new(200).set_body_json(conversation(9, "hi")))
            .expect(1)
            .mount(&server)
            .await;

        api_for(&server)
            .append_message(9, Role::Assistant, "Χάρις")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/conversations/9"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        api_for(&server).delete(9).await.unwrap();
    }
}
