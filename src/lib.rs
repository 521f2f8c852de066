// Public modules
pub mod api;
pub mod channel;
pub mod chat;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod retry;
pub mod types;
pub mod utils;

mod observability;

// Re-exports
pub use channel::{ChannelSignal, ChannelState, ChatChannel, ChatTransport, EventSink};
pub use client::{ApiClient, RequestBody, RequestOptions, UnauthorizedHandler};
pub use config::ClientConfig;
pub use credentials::SessionContext;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use retry::RetryPolicy;
pub use types::*;
