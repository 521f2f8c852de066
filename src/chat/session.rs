//! Core chat session management.
//!
//! A [`ChatSession`] is the single actor behind one chat conversation.  It
//! consumes the channel's signals in arrival order, accumulates streamed
//! chunks into the live message buffer, and persists the buffer once it has
//! been quiet for the debounce window.
//!
//! The session is driven by a loop of [`ChatSession::wait`] and
//! [`ChatSession::apply`]:
//!
//! ```no_run
//! # async fn drive(mut session: koine::chat::ChatSession) {
//! loop {
//!     let wakeup = session.wait().await;
//!     if session.apply(wakeup).await {
//!         break;
//!     }
//! }
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::ConversationStore;
use crate::channel::{ChannelSignal, ChatChannel, ChatTransport};
use crate::chat::config::SessionConfig;
use crate::chat::save_timer::SaveTimer;
use crate::error::{Error, Result};
use crate::observability::{SESSION_SAVE_ERRORS, SESSION_SAVES};
use crate::types::{
    ChatMessage, ChatRequest, Conversation, ConversationCreate, ConversationId,
    ConversationListItem, ConversationUpdate, Role, StreamEvent,
};

/// Shown when a question cannot be transmitted.
pub const NOT_CONNECTED_MESSAGE: &str = "Chat connection is not open";

/// Shown when the connection drops.
pub const CONNECTION_FAILED_MESSAGE: &str = "WebSocket connection failed";

/// Why [`ChatSession::wait`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wakeup {
    /// The channel produced a signal.
    Signal(ChannelSignal),
    /// The debounce window elapsed with a save pending.
    SaveDue,
    /// The channel's signal queue closed; nothing more will arrive.
    Closed,
}

/// State for one chat conversation.
pub struct ChatSession {
    config: SessionConfig,
    transport: Arc<dyn ChatTransport>,
    inbound: mpsc::UnboundedReceiver<ChannelSignal>,
    inbound_closed: bool,
    store: Arc<dyn ConversationStore>,
    save_timer: SaveTimer,
    messages: Vec<ChatMessage>,
    verse_reference: Option<String>,
    connected: bool,
    awaiting_response: bool,
    error: Option<String>,
    persistence_error: Option<String>,
    current: Option<Conversation>,
    conversations: Vec<ConversationListItem>,
}

impl ChatSession {
    /// Creates a session over an existing transport and its signal queue.
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        inbound: mpsc::UnboundedReceiver<ChannelSignal>,
        store: Arc<dyn ConversationStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            config,
            transport,
            inbound,
            inbound_closed: false,
            store,
            save_timer: SaveTimer::new(config.debounce),
            messages: Vec::new(),
            verse_reference: None,
            connected: false,
            awaiting_response: false,
            error: None,
            persistence_error: None,
            current: None,
            conversations: Vec::new(),
        }
    }

    /// Connects a new [`ChatChannel`] to `url` and builds a session on it.
    pub async fn open(
        url: Url,
        store: Arc<dyn ConversationStore>,
        config: SessionConfig,
    ) -> Result<Self> {
        let (channel, inbound) = ChatChannel::open(url).await?;
        Ok(Self::new(channel, inbound, store, config))
    }

    /// Returns the live message buffer.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the number of buffered messages.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    /// The last transport or stream error, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The last persistence failure, if any.
    pub fn persistence_error(&self) -> Option<&str> {
        self.persistence_error.as_deref()
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        self.current.as_ref()
    }

    /// The conversation list as of the last refresh.
    pub fn conversations(&self) -> &[ConversationListItem] {
        &self.conversations
    }

    /// Returns true if a debounced save is scheduled.
    pub fn save_pending(&self) -> bool {
        self.save_timer.is_armed()
    }

    pub fn verse_reference(&self) -> Option<&str> {
        self.verse_reference.as_deref()
    }

    /// Sets the verse attached to subsequent questions.
    pub fn set_verse_reference(&mut self, verse_reference: Option<String>) {
        self.verse_reference = verse_reference;
    }

    /// Appends the user's question and transmits it.
    ///
    /// Blank input is ignored and returns false.  When the channel is not
    /// open the message stays in the buffer, the session error is set, and
    /// false is returned.
    pub async fn submit(&mut self, input: &str) -> bool {
        let input = input.trim();
        if input.is_empty() {
            return false;
        }

        self.messages.push(ChatMessage::user(input));
        let request =
            ChatRequest::new(input).with_verse_reference(self.verse_reference.clone());
        let sent = self.transport.send(&request).await;
        if sent {
            self.awaiting_response = true;
            self.error = None;
        } else {
            self.error = Some(NOT_CONNECTED_MESSAGE.to_string());
        }
        self.buffer_changed();
        sent
    }

    /// Waits for the next thing the session must react to.
    ///
    /// Cancel-safe: dropping the future loses nothing.
    pub async fn wait(&mut self) -> Wakeup {
        if self.inbound_closed {
            self.save_timer.expired().await;
            return Wakeup::SaveDue;
        }

        let signal = tokio::select! {
            biased;
            signal = self.inbound.recv() => signal,
            _ = self.save_timer.expired() => return Wakeup::SaveDue,
        };
        match signal {
            Some(signal) => Wakeup::Signal(signal),
            None => {
                self.inbound_closed = true;
                Wakeup::Closed
            }
        }
    }

    /// Reacts to a wakeup.  Returns true once the channel is gone for good.
    pub async fn apply(&mut self, wakeup: Wakeup) -> bool {
        match wakeup {
            Wakeup::Signal(signal) => {
                self.handle_signal(signal);
                false
            }
            Wakeup::SaveDue => {
                // Failures are kept in `persistence_error`.
                let _ = self.save().await;
                false
            }
            Wakeup::Closed => {
                self.connected = false;
                self.awaiting_response = false;
                true
            }
        }
    }

    /// Applies one channel signal.
    pub fn handle_signal(&mut self, signal: ChannelSignal) {
        match signal {
            ChannelSignal::Event(event) => self.handle_event(event),
            ChannelSignal::ConnectionLost(reason) => self.handle_connection_lost(reason),
        }
    }

    /// Applies one stream event.
    pub fn handle_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Connected => {
                self.connected = true;
                self.error = None;
            }
            StreamEvent::Chunk(chunk) => {
                match self.messages.last_mut() {
                    Some(last) if last.role == Role::Assistant => last.content.push_str(&chunk),
                    _ => self.messages.push(ChatMessage::assistant(chunk)),
                }
                self.buffer_changed();
            }
            StreamEvent::Done => {
                self.awaiting_response = false;
                self.buffer_changed();
            }
            StreamEvent::Error(message) => {
                warn!(error = %message, "chat service reported an error");
                self.error = Some(message);
                self.awaiting_response = false;
                self.buffer_changed();
            }
        }
    }

    fn handle_connection_lost(&mut self, reason: Option<String>) {
        warn!(reason = ?reason, "chat connection lost");
        self.connected = false;
        self.error = Some(CONNECTION_FAILED_MESSAGE.to_string());
        if self.awaiting_response {
            self.awaiting_response = false;
            self.buffer_changed();
        }
    }

    /// Re-evaluates the debounce after the buffer or the awaiting flag moved.
    fn buffer_changed(&mut self) {
        self.save_timer.cancel();
        if !self.awaiting_response && !self.messages.is_empty() {
            self.save_timer.arm();
        }
    }

    /// Persists the whole buffer now.
    ///
    /// Creates a conversation titled after the first user message when none
    /// is current, else replaces the current conversation's messages.  On
    /// success the conversation list is refreshed.
    pub async fn save(&mut self) -> Result<()> {
        self.save_timer.cancel();
        if self.messages.is_empty() {
            return Ok(());
        }

        let stored: Vec<_> = self.messages.iter().map(ChatMessage::to_stored).collect();
        let result = match &self.current {
            Some(current) => {
                self.store
                    .update(current.id, &ConversationUpdate::messages(stored))
                    .await
            }
            None => {
                self.store
                    .create(&ConversationCreate::from_messages(stored))
                    .await
            }
        };

        match result {
            Ok(conversation) => {
                SESSION_SAVES.click();
                info!(
                    id = conversation.id,
                    messages = self.messages.len(),
                    "conversation saved"
                );
                self.current = Some(conversation);
                self.persistence_error = None;
                self.refresh_conversations().await
            }
            Err(err) => {
                SESSION_SAVE_ERRORS.click();
                warn!(error = %err, "saving conversation failed");
                self.persistence_error = Some(persistence_message(&err, "Failed to save messages"));
                Err(err)
            }
        }
    }

    /// Performs a pending save immediately.
    pub async fn flush(&mut self) -> Result<()> {
        if self.save_timer.is_armed() {
            self.save().await
        } else {
            Ok(())
        }
    }

    /// Reloads the conversation list.
    pub async fn refresh_conversations(&mut self) -> Result<()> {
        match self.store.list(0, self.config.history_limit).await {
            Ok(conversations) => {
                debug!(count = conversations.len(), "conversation list refreshed");
                self.conversations = conversations;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "loading conversations failed");
                self.persistence_error =
                    Some(persistence_message(&err, "Failed to load conversations"));
                Err(err)
            }
        }
    }

    /// Makes `id` the current conversation and loads its messages.
    ///
    /// A pending save of the previous buffer is flushed first.
    pub async fn load_conversation(&mut self, id: ConversationId) -> Result<()> {
        if let Err(err) = self.flush().await {
            debug!(error = %err, "pending save failed before switching conversations");
        }
        match self.store.get(id).await {
            Ok(conversation) => {
                self.messages = conversation
                    .messages
                    .iter()
                    .map(ChatMessage::from_stored)
                    .collect();
                info!(id, messages = self.messages.len(), "conversation loaded");
                self.current = Some(conversation);
                self.persistence_error = None;
                self.save_timer.cancel();
                Ok(())
            }
            Err(err) => {
                warn!(id, error = %err, "loading conversation failed");
                self.persistence_error =
                    Some(persistence_message(&err, "Failed to load conversation"));
                Err(err)
            }
        }
    }

    /// Forgets the current conversation and empties the buffer.
    ///
    /// A pending save of the previous buffer is flushed first.
    pub async fn start_new_conversation(&mut self) -> Result<()> {
        let flushed = self.flush().await;
        self.save_timer.cancel();
        self.current = None;
        self.messages.clear();
        self.error = None;
        flushed
    }

    /// Deletes `id` from the store, forgetting it if it is current.
    pub async fn delete_conversation(&mut self, id: ConversationId) -> Result<()> {
        if let Err(err) = self.store.delete(id).await {
            warn!(id, error = %err, "deleting conversation failed");
            self.persistence_error =
                Some(persistence_message(&err, "Failed to delete conversation"));
            return Err(err);
        }
        if self.current.as_ref().is_some_and(|c| c.id == id) {
            self.current = None;
            self.save_timer.cancel();
        }
        info!(id, "conversation deleted");
        self.refresh_conversations().await
    }

    /// Tears the session down: no save fires afterwards and the channel is
    /// closed.
    pub async fn close(&mut self) {
        self.save_timer.cancel();
        self.transport.close().await;
        self.connected = false;
        self.awaiting_response = false;
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("messages", &self.messages.len())
            .field("connected", &self.connected)
            .field("awaiting_response", &self.awaiting_response)
            .field("current", &self.current.as_ref().map(|c| c.id))
            .field("save_pending", &self.save_timer.is_armed())
            .finish()
    }
}

fn persistence_message(err: &Error, fallback: &str) -> String {
    err.detail().unwrap_or(fallback).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelState;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    struct FakeTransport {
        state: Mutex<ChannelState>,
        sent: Mutex<Vec<ChatRequest>>,
    }

    impl FakeTransport {
        fn new(state: ChannelState) -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(state),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<ChatRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatTransport for FakeTransport {
        async fn send(&self, request: &ChatRequest) -> bool {
            let mut state = self.state.lock().unwrap();
            if !state.is_open() {
                return false;
            }
            *state = ChannelState::Streaming;
            self.sent.lock().unwrap().push(request.clone());
            true
        }

        async fn close(&self) {
            *self.state.lock().unwrap() = ChannelState::Closed;
        }

        async fn state(&self) -> ChannelState {
            *self.state.lock().unwrap()
        }
    }

    #[derive(Default)]
    struct FakeStore {
        conversations: Mutex<BTreeMap<ConversationId, Conversation>>,
        creates: Mutex<Vec<ConversationCreate>>,
        updates: Mutex<Vec<(ConversationId, ConversationUpdate)>>,
        lists: Mutex<usize>,
        fail_writes: Mutex<bool>,
    }

    impl FakeStore {
        fn creates(&self) -> Vec<ConversationCreate> {
            self.creates.lock().unwrap().clone()
        }

        fn updates(&self) -> Vec<(ConversationId, ConversationUpdate)> {
            self.updates.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ConversationStore for FakeStore {
        async fn list(&self, _skip: u64, limit: u64) -> Result<Vec<ConversationListItem>> {
            *self.lists.lock().unwrap() += 1;
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .values()
                .take(limit as usize)
                .map(|c| ConversationListItem {
                    id: c.id,
                    title: c.title.clone(),
                    message_count: c.messages.len() as u64,
                    created_at: c.created_at.clone(),
                    updated_at: c.updated_at.clone(),
                })
                .collect())
        }

        async fn get(&self, id: ConversationId) -> Result<Conversation> {
            self.conversations
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::client(404, Some("Conversation not found".to_string())))
        }

        async fn create(&self, data: &ConversationCreate) -> Result<Conversation> {
            if *self.fail_writes.lock().unwrap() {
                return Err(Error::server(503, None));
            }
            self.creates.lock().unwrap().push(data.clone());
            let mut conversations = self.conversations.lock().unwrap();
            let id = conversations.len() as ConversationId + 1;
            let conversation = Conversation {
                id,
                user_id: Some(1),
                title: data.title.clone(),
                messages: data.messages.clone().unwrap_or_default(),
                created_at: "2026-10-14T09:00:00".to_string(),
                updated_at: "2026-10-14T09:00:00".to_string(),
            };
            conversations.insert(id, conversation.clone());
            Ok(conversation)
        }

        async fn update(
            &self,
            id: ConversationId,
            data: &ConversationUpdate,
        ) -> Result<Conversation> {
            if *self.fail_writes.lock().unwrap() {
                return Err(Error::server(503, None));
            }
            self.updates.lock().unwrap().push((id, data.clone()));
            let mut conversations = self.conversations.lock().unwrap();
            let conversation = conversations
                .get_mut(&id)
                .ok_or_else(|| Error::client(404, Some("Conversation not found".to_string())))?;
            if let Some(messages) = &data.messages {
                conversation.messages = messages.clone();
            }
            Ok(conversation.clone())
        }

        async fn delete(&self, id: ConversationId) -> Result<()> {
            self.conversations.lock().unwrap().remove(&id);
            Ok(())
        }
    }

    struct Fixture {
        session: ChatSession,
        signals: mpsc::UnboundedSender<ChannelSignal>,
        transport: Arc<FakeTransport>,
        store: Arc<FakeStore>,
    }

    fn fixture(state: ChannelState) -> Fixture {
        let transport = FakeTransport::new(state);
        let store = Arc::new(FakeStore::default());
        let (signals, inbound) = mpsc::unbounded_channel();
        let session = ChatSession::new(
            transport.clone(),
            inbound,
            store.clone(),
            SessionConfig::new(),
        );
        Fixture {
            session,
            signals,
            transport,
            store,
        }
    }

    impl Fixture {
        fn push(&self, event: StreamEvent) {
            self.signals.send(ChannelSignal::Event(event)).unwrap();
        }

        /// Applies the next `n` wakeups.
        async fn step(&mut self, n: usize) {
            for _ in 0..n {
                let wakeup = self.session.wait().await;
                self.session.apply(wakeup).await;
            }
        }
    }

    fn chunk(text: &str) -> StreamEvent {
        StreamEvent::Chunk(text.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn chunks_accumulate_into_one_message() {
        let mut f = fixture(ChannelState::Open);
        f.push(StreamEvent::Connected);
        f.step(1).await;
        assert!(f.session.is_connected());

        assert!(f.session.submit("What does λόγος mean?").await);
        assert!(f.session.is_awaiting_response());
        let chunks = ["In John 1:1 ", "λόγος ", "denotes ", "the Word."];
        for c in chunks {
            f.push(chunk(c));
        }
        f.push(StreamEvent::Done);
        f.step(chunks.len() + 1).await;

        assert!(!f.session.is_awaiting_response());
        assert_eq!(f.session.message_count(), 2);
        let reply = &f.session.messages()[1];
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, chunks.concat());
        assert!(f.session.save_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn no_save_while_awaiting_response() {
        let mut f = fixture(ChannelState::Open);
        assert!(f.session.submit("hello").await);
        assert!(!f.session.save_pending());
        f.push(chunk("partial"));
        f.step(1).await;
        assert!(!f.session.save_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_mutations_save_once() {
        let mut f = fixture(ChannelState::Closed);
        for question in ["first", "second", "third"] {
            assert!(!f.session.submit(question).await);
            tokio::time::advance(Duration::from_millis(300)).await;
        }
        assert!(f.store.creates().is_empty());

        let start = Instant::now();
        let wakeup = f.session.wait().await;
        assert_eq!(wakeup, Wakeup::SaveDue);
        assert!(start.elapsed() >= Duration::from_millis(700));
        assert!(start.elapsed() < Duration::from_millis(1000));
        f.session.apply(wakeup).await;

        let creates = f.store.creates();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].title.as_deref(), Some("first"));
        assert_eq!(creates[0].messages.as_ref().map(Vec::len), Some(3));
        assert_eq!(*f.store.lists.lock().unwrap(), 1);
        assert_eq!(f.session.current_conversation().map(|c| c.id), Some(1));
        assert_eq!(f.session.conversations().len(), 1);
        assert!(!f.session.save_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn later_saves_update_current_conversation() {
        let mut f = fixture(ChannelState::Open);
        assert!(f.session.submit("question").await);
        f.push(chunk("answer"));
        f.push(StreamEvent::Done);
        f.step(3).await;
        assert_eq!(f.store.creates().len(), 1);

        assert!(f.session.submit("follow-up").await);
        f.push(chunk("more"));
        f.push(StreamEvent::Done);
        f.step(3).await;

        let updates = f.store.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, 1);
        assert_eq!(updates[0].1.messages.as_ref().map(Vec::len), Some(4));
        assert_eq!(f.transport.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn error_keeps_partial_reply() {
        let mut f = fixture(ChannelState::Open);
        assert!(f.session.submit("question").await);
        f.push(chunk("Partial "));
        f.push(StreamEvent::Error("AI service error".to_string()));
        f.step(2).await;

        assert_eq!(f.session.error(), Some("AI service error"));
        assert!(!f.session.is_awaiting_response());
        assert_eq!(f.session.messages()[1].content, "Partial ");
        assert!(f.session.save_pending());

        f.push(StreamEvent::Connected);
        f.step(1).await;
        assert!(f.session.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_without_connection_sends_nothing() {
        let mut f = fixture(ChannelState::Connecting);
        assert!(!f.session.submit("hello").await);
        assert!(f.transport.sent().is_empty());
        assert_eq!(f.session.error(), Some(NOT_CONNECTED_MESSAGE));
        assert!(!f.session.is_awaiting_response());
        assert_eq!(f.session.message_count(), 1);

        assert!(!f.session.submit("   ").await);
        assert_eq!(f.session.message_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_carries_verse_reference() {
        let mut f = fixture(ChannelState::Open);
        f.session
            .set_verse_reference(Some("Romans 8:28".to_string()));
        assert!(f.session.submit("  What is συνεργεῖ?  ").await);
        let sent = f.transport.sent();
        assert_eq!(sent[0].message, "What is συνεργεῖ?");
        assert_eq!(sent[0].verse_reference.as_deref(), Some("Romans 8:28"));
    }

    #[tokio::test(start_paused = true)]
    async fn connection_loss_clears_awaiting() {
        let mut f = fixture(ChannelState::Open);
        f.push(StreamEvent::Connected);
        f.step(1).await;
        assert!(f.session.submit("question").await);

        f.signals
            .send(ChannelSignal::ConnectionLost(Some("reset".to_string())))
            .unwrap();
        f.step(1).await;
        assert!(!f.session.is_connected());
        assert!(!f.session.is_awaiting_response());
        assert_eq!(f.session.error(), Some(CONNECTION_FAILED_MESSAGE));
        assert!(f.session.save_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_queue_ends_the_loop() {
        let Fixture {
            mut session,
            signals,
            ..
        } = fixture(ChannelState::Open);
        drop(signals);
        let wakeup = session.wait().await;
        assert_eq!(wakeup, Wakeup::Closed);
        assert!(session.apply(wakeup).await);
    }

    #[tokio::test(start_paused = true)]
    async fn saved_conversation_reloads_identically() {
        let mut f = fixture(ChannelState::Open);
        assert!(f.session.submit("Explain χάρις").await);
        f.push(chunk("Grace, "));
        f.push(chunk("unmerited favour."));
        f.push(StreamEvent::Done);
        f.step(4).await;
        let original = f.session.messages().to_vec();
        assert!(original.iter().all(|m| m.timestamp.is_some()));

        f.session.start_new_conversation().await.unwrap();
        assert!(f.session.messages().is_empty());
        assert!(f.session.current_conversation().is_none());

        f.session.load_conversation(1).await.unwrap();
        assert_eq!(f.session.messages(), original.as_slice());
        assert!(!f.session.save_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn switching_flushes_pending_save() {
        let mut f = fixture(ChannelState::Closed);
        assert!(!f.session.submit("unsaved").await);
        assert!(f.session.save_pending());

        f.session.start_new_conversation().await.unwrap();
        assert_eq!(f.store.creates().len(), 1);
        assert!(!f.session.save_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn load_missing_conversation_sets_persistence_error() {
        let mut f = fixture(ChannelState::Open);
        assert!(f.session.load_conversation(42).await.is_err());
        assert_eq!(f.session.persistence_error(), Some("Conversation not found"));
        assert!(f.session.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_is_reported_separately() {
        let mut f = fixture(ChannelState::Closed);
        *f.store.fail_writes.lock().unwrap() = true;
        assert!(!f.session.submit("question").await);
        f.step(1).await;

        assert_eq!(f.session.persistence_error(), Some("Failed to save messages"));
        assert_eq!(f.session.error(), Some(NOT_CONNECTED_MESSAGE));
        assert!(f.session.current_conversation().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_current_conversation_forgets_it() {
        let mut f = fixture(ChannelState::Closed);
        assert!(!f.session.submit("question").await);
        f.session.flush().await.unwrap();
        assert_eq!(f.session.current_conversation().map(|c| c.id), Some(1));

        f.session.delete_conversation(1).await.unwrap();
        assert!(f.session.current_conversation().is_none());
        assert!(f.session.conversations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_pending_save() {
        let mut f = fixture(ChannelState::Open);
        f.session.handle_event(StreamEvent::Connected);
        assert!(f.session.submit("question").await);
        f.push(StreamEvent::Done);
        f.step(1).await;
        assert!(f.session.save_pending());

        f.session.close().await;
        assert!(!f.session.save_pending());
        assert_eq!(f.transport.state().await, ChannelState::Closed);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(f.store.creates().is_empty());
    }
}
