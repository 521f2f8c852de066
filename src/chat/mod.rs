//! Chat sessions over the streaming channel.
//!
//! - [`session`]: the per-conversation state machine and its actor loop
//! - [`config`]: CLI argument parsing and session configuration
//! - [`commands`]: slash command parsing for the terminal client
//! - [`save_timer`]: the debounce deadline that paces persistence
//! - [`render`]: terminal output for replies, verses and lexicon entries

mod commands;
mod config;
mod render;
mod save_timer;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_DEBOUNCE, SessionConfig};
pub use render::{PlainTextRenderer, Renderer};
pub use save_timer::SaveTimer;
pub use session::{CONNECTION_FAILED_MESSAGE, ChatSession, NOT_CONNECTED_MESSAGE, Wakeup};
