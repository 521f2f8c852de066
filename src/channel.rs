//! The streaming chat channel.
//!
//! One [`ChatChannel`] owns one WebSocket connection to the chat service.
//! Inbound frames are translated into [`StreamEvent`]s and handed to an
//! [`EventSink`] strictly in arrival order.  Outbound requests are queued to
//! the connection task, which owns both halves of the socket.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::observability::{
    CHANNEL_CONNECTS, CHANNEL_DISCONNECTS, CHANNEL_DROPPED_SENDS, CHANNEL_FRAMES,
    CHANNEL_MALFORMED_FRAMES, CHANNEL_SENDS,
};
use crate::types::{ChatRequest, StreamEvent, StreamFrame, WireChatRequest};

/// Path of the chat endpoint relative to the WebSocket origin.
pub const STREAM_PATH: &str = "api/chat/stream";

/// Lifecycle of a channel.  A closed channel is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Created, not yet connecting.
    Idle,
    /// Handshake in progress.
    Connecting,
    /// Connected with no exchange outstanding.
    Open,
    /// Connected and awaiting the end of an exchange.
    Streaming,
    /// Closed locally or lost.
    Closed,
}

impl ChannelState {
    /// Returns true if requests can be sent.
    pub fn is_open(self) -> bool {
        matches!(self, ChannelState::Open | ChannelState::Streaming)
    }
}

/// What a consumer receives from the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSignal {
    /// A translated inbound frame, or the handshake notification.
    Event(StreamEvent),
    /// The connection failed or the peer went away.
    ConnectionLost(Option<String>),
}

/// Receives the channel's output.  Registered once per channel lifetime.
pub trait EventSink: Send + Sync + 'static {
    fn on_event(&self, event: StreamEvent);
    fn on_connection_lost(&self, reason: Option<String>);
}

impl EventSink for mpsc::UnboundedSender<ChannelSignal> {
    fn on_event(&self, event: StreamEvent) {
        if self.send(ChannelSignal::Event(event)).is_err() {
            debug!("chat event dropped; consumer is gone");
        }
    }

    fn on_connection_lost(&self, reason: Option<String>) {
        let _ = self.send(ChannelSignal::ConnectionLost(reason));
    }
}

/// The outbound half of a chat connection, as the session sees it.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Transmit `request`.  Returns false, without writing anything, when the
    /// channel is not open.
    async fn send(&self, request: &ChatRequest) -> bool;
    /// Close the connection if it is connecting or open.
    async fn close(&self);
    /// The current lifecycle state.
    async fn state(&self) -> ChannelState;
}

/// Parse one inbound text frame.
///
/// Returns `Ok(None)` for well-formed frames that carry nothing to report
/// and a `Protocol` error for anything that is not a frame object.
pub fn parse_frame(text: &str) -> Result<Option<StreamEvent>> {
    let frame: StreamFrame = serde_json::from_str(text).map_err(|e| {
        Error::protocol(format!("malformed chat frame: {e}"), Some(Box::new(e)))
    })?;
    Ok(frame.into_event())
}

/// The chat endpoint for the configured origin.
pub fn stream_url(config: &ClientConfig) -> Result<Url> {
    config.websocket_url(STREAM_PATH)
}

struct Startup {
    outbound_rx: mpsc::UnboundedReceiver<String>,
    shutdown_rx: oneshot::Receiver<()>,
}

/// A single WebSocket connection to the chat service.
pub struct ChatChannel {
    url: Url,
    state: Arc<RwLock<ChannelState>>,
    outbound: mpsc::UnboundedSender<String>,
    startup: Mutex<Option<Startup>>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl ChatChannel {
    /// Create an idle channel for `url`.
    pub fn new(url: Url) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        Self {
            url,
            state: Arc::new(RwLock::new(ChannelState::Idle)),
            outbound,
            startup: Mutex::new(Some(Startup {
                outbound_rx,
                shutdown_rx,
            })),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
        }
    }

    /// Create a channel, connect it, and return it with its signal queue.
    pub async fn open(url: Url) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<ChannelSignal>)> {
        let channel = Arc::new(Self::new(url));
        let (tx, rx) = mpsc::unbounded_channel();
        channel.connect(tx).await?;
        Ok((channel, rx))
    }

    /// The endpoint this channel connects to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Start connecting in the background, delivering everything to `sink`.
    ///
    /// A channel connects at most once.
    pub async fn connect(&self, sink: impl EventSink) -> Result<()> {
        let Some(startup) = self.startup.lock().await.take() else {
            return Err(Error::validation(
                "chat channel has already been connected",
                None,
            ));
        };
        {
            let mut state = self.state.write().await;
            if *state != ChannelState::Idle {
                return Err(Error::validation(
                    format!("cannot connect a channel in state {:?}", *state),
                    None,
                ));
            }
            *state = ChannelState::Connecting;
        }
        info!(url = %self.url, "connecting chat channel");
        tokio::spawn(Self::run(
            self.url.clone(),
            Arc::clone(&self.state),
            sink,
            startup,
        ));
        Ok(())
    }

    async fn run(
        url: Url,
        state: Arc<RwLock<ChannelState>>,
        sink: impl EventSink,
        startup: Startup,
    ) {
        let Startup {
            mut outbound_rx,
            mut shutdown_rx,
        } = startup;

        let connected = tokio::select! {
            _ = &mut shutdown_rx => {
                info!("chat channel closed before the handshake completed");
                *state.write().await = ChannelState::Closed;
                return;
            }
            result = connect_async(url.as_str()) => result,
        };
        let ws_stream = match connected {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                warn!(url = %url, error = %e, "chat channel connection failed");
                *state.write().await = ChannelState::Closed;
                CHANNEL_DISCONNECTS.click();
                sink.on_connection_lost(Some(e.to_string()));
                return;
            }
        };

        {
            let mut state = state.write().await;
            if *state != ChannelState::Connecting {
                debug!(state = ?*state, "chat channel closed during the handshake");
                return;
            }
            *state = ChannelState::Open;
        }
        CHANNEL_CONNECTS.click();
        info!(url = %url, "chat channel open");
        sink.on_event(StreamEvent::Connected);

        let (mut write, mut read) = ws_stream.split();
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!(error = %e, "close frame not delivered");
                    }
                    *state.write().await = ChannelState::Closed;
                    info!("chat channel closed");
                    break;
                }
                Some(payload) = outbound_rx.recv() => {
                    if let Err(e) = write.send(Message::Text(payload.into())).await {
                        warn!(error = %e, "chat send failed");
                        *state.write().await = ChannelState::Closed;
                        CHANNEL_DISCONNECTS.click();
                        sink.on_connection_lost(Some(e.to_string()));
                        break;
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            CHANNEL_FRAMES.click();
                            match parse_frame(text.as_str()) {
                                Ok(Some(event)) => {
                                    if event.is_terminal() {
                                        let mut state = state.write().await;
                                        if *state == ChannelState::Streaming {
                                            *state = ChannelState::Open;
                                        }
                                    }
                                    sink.on_event(event);
                                }
                                Ok(None) => {
                                    debug!("ignoring chat frame without content");
                                }
                                Err(err) => {
                                    CHANNEL_MALFORMED_FRAMES.click();
                                    warn!(error = %err, "dropping malformed chat frame");
                                }
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let reason = frame
                                .map(|f| f.reason.as_str().to_string())
                                .filter(|reason| !reason.is_empty());
                            warn!(reason = ?reason, "chat channel closed by peer");
                            *state.write().await = ChannelState::Closed;
                            CHANNEL_DISCONNECTS.click();
                            sink.on_connection_lost(reason);
                            break;
                        }
                        Some(Ok(_)) => {
                            // ping/pong are answered by tungstenite
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "chat channel error");
                            *state.write().await = ChannelState::Closed;
                            CHANNEL_DISCONNECTS.click();
                            sink.on_connection_lost(Some(e.to_string()));
                            break;
                        }
                        None => {
                            warn!("chat channel stream ended");
                            *state.write().await = ChannelState::Closed;
                            CHANNEL_DISCONNECTS.click();
                            sink.on_connection_lost(None);
                            break;
                        }
                    }
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ChatTransport for ChatChannel {
    async fn send(&self, request: &ChatRequest) -> bool {
        let mut state = self.state.write().await;
        if !state.is_open() {
            CHANNEL_DROPPED_SENDS.click();
            warn!(state = ?*state, "chat channel is not open; message not sent");
            return false;
        }
        let payload = match serde_json::to_string(&WireChatRequest::from(request)) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "could not encode chat request");
                return false;
            }
        };
        if self.outbound.send(payload).is_err() {
            CHANNEL_DROPPED_SENDS.click();
            warn!("chat connection task has exited; message not sent");
            return false;
        }
        CHANNEL_SENDS.click();
        *state = ChannelState::Streaming;
        true
    }

    async fn close(&self) {
        let mut state = self.state.write().await;
        match *state {
            ChannelState::Connecting | ChannelState::Open | ChannelState::Streaming => {}
            ChannelState::Idle | ChannelState::Closed => {
                debug!(state = ?*state, "chat channel close ignored");
                return;
            }
        }
        if let Some(shutdown_tx) = self.shutdown_tx.lock().await.take() {
            let _ = shutdown_tx.send(());
        }
        *state = ChannelState::Closed;
    }

    async fn state(&self) -> ChannelState {
        *self.state.read().await
    }
}

impl std::fmt::Debug for ChatChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatChannel")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}
