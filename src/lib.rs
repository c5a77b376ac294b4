//! Overlord Gateway - Twitch chat bot bridging AI completion, TTS, and flight-sim data
//!
//! The core of the crate is the command/event dispatch subsystem:
//! - classifying inbound chat messages and voice commands and routing them
//!   to handlers
//! - a registry of named commands (TTS config, alerts, flight status,
//!   airport lookup, say, streamer admin)
//! - mutable runtime bot state (active flag, prefixes, personality, TTS
//!   parameters)
//! - the outbound TTS-relay connection with bounded-retry reconnect
//! - the voice command queue fed by a background speech-recognition stream
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     Inbound                           │
//! │   Twitch chat        │     Speech recognition         │
//! └───────────┬──────────┴──────────┬────────────────────┘
//!             │              Voice queue / trigger match
//! ┌───────────▼─────────────────────▼────────────────────┐
//! │                  Dispatch Router                      │
//! │   mentions │ commands │ streamer admin │ pass-through │
//! └───────────┬───────────────────────┬──────────────────┘
//!             │                       │
//! ┌───────────▼───────────┐ ┌─────────▼─────────────────┐
//! │  AI responder          │ │  Flight data / alerts     │
//! └───────────┬───────────┘ └─────────┬─────────────────┘
//!             │                       │
//! ┌───────────▼───────────────────────▼──────────────────┐
//! │        Chat replies        │      TTS relay           │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod alerts;
pub mod channels;
pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod flight;
pub mod providers;
pub mod relay;
pub mod router;
pub mod state;
pub mod voice;

pub use agent::{APOLOGY, Responder, token_budget};
pub use alerts::{Alert, AlertStore};
pub use channels::{Channel, ChatSink, IncomingMessage, OutgoingMessage, TwitchChannel};
pub use config::Config;
pub use daemon::Daemon;
pub use db::{ConversationEntry, ConversationRepo, DbConn, DbPool};
pub use error::{Error, Result};
pub use flight::{AirportInfo, NavmapClient, SimInfo};
pub use providers::{CompletionProvider, OpenAiProvider, PromptMessage, Role};
pub use relay::{
    RelayCommand, RelayHandle, RelayManager, RelaySink, RelayState, RelayTransport, RelayWire,
};
pub use router::{AdminCommand, Command, InboundEvent, Router};
pub use state::{BotState, SharedState};
pub use voice::{SpeechSource, VoiceQueue};
