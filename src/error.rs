//! Error types for the Overlord gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the gateway
///
/// Propagation policy: handler-level errors never escape the dispatch
/// router; router-level errors never escape the event-loop task. Only
/// `Config` is fatal, and only before the daemon starts.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration at startup (fatal)
    #[error("configuration error: {0}")]
    Config(String),

    /// Bad command arguments, recovered with a user-facing message
    #[error("invalid input: {0}")]
    UserInput(String),

    /// AI or flight-data provider failure, recovered with an apology
    #[error("upstream error: {0}")]
    Upstream(String),

    /// AI provider rate limit
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Relay transport closed or never established; caller decides
    /// whether to drop or retry the message
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// Chat channel error
    #[error("channel error: {0}")]
    Channel(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Voice pipeline error
    #[error("voice error: {0}")]
    Voice(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// WebSocket error
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
