//! Chat platform adapters
//!
//! The gateway talks to chat through the `Channel` trait; the dispatch
//! router only ever sees the narrower `ChatSink` reply capability.

mod twitch;

use async_trait::async_trait;

pub use twitch::{TwitchChannel, parse_irc_line};

use crate::Result;

/// A message received from chat
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Sender login, lowercased
    pub author: String,
    /// Raw message content
    pub content: String,
    /// Channel the message arrived on
    pub channel: String,
}

/// A message to send to chat
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Target channel
    pub channel: String,
    /// Message content
    pub content: String,
}

/// A chat platform adapter
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &'static str;

    /// Connect to the platform
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from the platform
    async fn disconnect(&mut self) -> Result<()>;

    /// Send a message
    async fn send(&self, message: OutgoingMessage) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;
}

/// Reply capability handed to the dispatch router
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Send `text` to `channel`
    async fn reply(&self, channel: &str, text: &str) -> Result<()>;
}
