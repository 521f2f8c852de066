//! Configuration types for chat sessions and the `koine-chat` tool.
//!
//! CLI arguments are parsed with `arrrg` and resolved into a [`ChatConfig`]
//! that carries the client, channel and session settings.

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::api::DEFAULT_LIMIT;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Quiet window before the buffer is persisted.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Command-line arguments for the koine-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// HTTP origin of the study service.
    #[arrrg(optional, "Service origin (default: $KOINE_API_URL or http://localhost:8000)", "URL")]
    pub api_url: Option<String>,

    /// Verse the conversation starts out discussing.
    #[arrrg(optional, "Verse reference to discuss, e.g. \"John 3:16\"", "REF")]
    pub verse: Option<String>,

    /// Bearer token from an earlier login.
    #[arrrg(optional, "Bearer token (default: $KOINE_TOKEN)", "TOKEN")]
    pub token: Option<String>,

    /// Number of conversations fetched for the history list.
    #[arrrg(optional, "Conversations shown by /history (default: 50)", "N")]
    pub history_limit: Option<u64>,

    /// Disable ANSI colors/styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Timing and paging for a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Quiet window after the last mutation before a save fires.
    pub debounce: Duration,
    /// Page size for the conversation list.
    pub history_limit: u64,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            history_limit: DEFAULT_LIMIT,
        }
    }

    /// Sets the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the conversation list page size.
    pub fn with_history_limit(mut self, history_limit: u64) -> Self {
        self.history_limit = history_limit;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved configuration for the koine-chat tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Where the service lives and how requests are retried.
    pub client: ClientConfig,
    /// Session timing.
    pub session: SessionConfig,
    /// Verse context attached to every question.
    pub verse_reference: Option<String>,
    /// Credential to start with.
    pub token: Option<String>,
    /// Whether to use ANSI colors in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a configuration for the default origin with no verse context.
    pub fn new() -> Self {
        Self {
            client: ClientConfig::new(),
            session: SessionConfig::new(),
            verse_reference: None,
            token: None,
            use_color: true,
        }
    }

    /// Sets the client configuration.
    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// Sets the session configuration.
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Sets the verse context.
    pub fn with_verse_reference(mut self, verse_reference: Option<String>) -> Self {
        self.verse_reference = verse_reference;
        self
    }

    /// Sets the starting credential.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Enables or disables ANSI colors.
    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        let client = match args.api_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => ClientConfig::new().with_api_url(url)?,
            _ => ClientConfig::from_env()?,
        };

        let mut session = SessionConfig::new();
        if let Some(limit) = args.history_limit {
            if limit == 0 {
                return Err(Error::validation(
                    "history limit must be positive",
                    Some("history_limit".to_string()),
                ));
            }
            session = session.with_history_limit(limit);
        }

        let verse_reference = args
            .verse
            .map(|verse| verse.trim().to_string())
            .filter(|verse| !verse.is_empty());
        let token = args
            .token
            .or_else(|| std::env::var("KOINE_TOKEN").ok())
            .filter(|token| !token.is_empty());

        Ok(ChatConfig {
            client,
            session,
            verse_reference,
            token,
            use_color: !args.no_color,
        })
    }
}
