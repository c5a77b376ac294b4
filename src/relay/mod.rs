//! TTS relay connection manager
//!
//! Maintains the single outbound websocket session to the text-to-speech
//! relay. Connection attempts are bounded and sequential; exhausting them
//! leaves the manager `Disconnected` so a later send failure can trigger a
//! fresh cycle. No other component holds the transport, only the manager's
//! send capability.

mod transport;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

pub use transport::{RelayTransport, RelayWire, WsTransport};

use crate::config::RelaySettings;
use crate::state::BotState;
use crate::{Error, Result};

/// Outbound command shapes on the relay wire
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "command")]
pub enum RelayCommand {
    /// Speak `text` with the given TTS parameters
    Overlord {
        text: String,
        voice: String,
        speed: f64,
        volume: f64,
    },
    /// Push new TTS parameters to the relay
    #[serde(rename = "UpdateTTSSettings")]
    UpdateTtsSettings { voice: String, speed: f64, volume: f64 },
}

impl RelayCommand {
    /// Build a spoken-text command from the current TTS settings
    #[must_use]
    pub fn spoken(text: impl Into<String>, state: &BotState) -> Self {
        Self::Overlord {
            text: text.into(),
            voice: state.tts_voice.clone(),
            speed: state.tts_speed,
            volume: state.tts_volume,
        }
    }

    /// Build a settings-update command from the current TTS settings
    #[must_use]
    pub fn settings(state: &BotState) -> Self {
        Self::UpdateTtsSettings {
            voice: state.tts_voice.clone(),
            speed: state.tts_speed,
            volume: state.tts_volume,
        }
    }
}

/// Relay session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// No session; `connect` may be invoked
    Disconnected,
    /// A connection cycle is in progress
    Connecting,
    /// Session established
    Connected,
    /// Non-retryable failure (no relay URL configured)
    Failed,
}

/// Relay connection manager
pub struct RelayManager {
    settings: RelaySettings,
    transport: Box<dyn RelayTransport>,
    wire: Option<Box<dyn RelayWire>>,
    state: RelayState,
}

impl RelayManager {
    /// Create a manager using the production websocket transport
    #[must_use]
    pub fn new(settings: RelaySettings) -> Self {
        Self::with_transport(settings, Box::new(WsTransport))
    }

    /// Create a manager with a custom transport (tests)
    #[must_use]
    pub fn with_transport(settings: RelaySettings, transport: Box<dyn RelayTransport>) -> Self {
        let state = if settings.url.trim().is_empty() {
            RelayState::Failed
        } else {
            RelayState::Disconnected
        };
        Self {
            settings,
            transport,
            wire: None,
            state,
        }
    }

    /// Current session state
    #[must_use]
    pub const fn state(&self) -> RelayState {
        self.state
    }

    /// Establish the relay session
    ///
    /// No-op when already connected. Makes up to the configured number of
    /// sequential attempts, sleeping the configured delay between failures.
    /// Exhausting every attempt logs a terminal failure and leaves the
    /// manager `Disconnected`; callers re-invoke on a later send failure.
    pub async fn connect(&mut self) {
        if self.state == RelayState::Connected {
            tracing::info!("relay connection already established");
            return;
        }
        if self.state == RelayState::Failed {
            tracing::warn!("relay has no usable URL, skipping connect");
            return;
        }

        self.state = RelayState::Connecting;
        let max_attempts = self.settings.max_attempts;

        for attempt in 1..=max_attempts {
            tracing::info!(url = %self.settings.url, attempt, "connecting to TTS relay");
            match self.transport.connect(&self.settings.url).await {
                Ok(wire) => {
                    self.wire = Some(wire);
                    self.state = RelayState::Connected;
                    tracing::info!("connected to TTS relay");
                    return;
                }
                Err(e) => {
                    tracing::error!(error = %e, attempt, "relay connection attempt failed");
                }
            }

            if attempt < max_attempts {
                tracing::info!(
                    delay_secs = self.settings.retry_delay.as_secs(),
                    "retrying relay connection"
                );
                tokio::time::sleep(self.settings.retry_delay).await;
            }
        }

        self.state = RelayState::Disconnected;
        tracing::error!(
            attempts = max_attempts,
            "failed to connect to TTS relay, giving up until next send"
        );
    }

    /// Send a command to the relay
    ///
    /// # Errors
    ///
    /// Returns `Error::ConnectionLost` if the session was never established
    /// or the transport closed mid-send (a reconnect cycle is run before the
    /// error is surfaced, so the caller decides whether to retry the
    /// message). Other transport errors propagate unchanged.
    pub async fn send(&mut self, command: &RelayCommand) -> Result<()> {
        let Some(wire) = self.wire.as_mut() else {
            return Err(Error::ConnectionLost(
                "relay connection not established".to_string(),
            ));
        };

        let text = serde_json::to_string(command)?;
        match wire.send_text(text).await {
            Ok(()) => Ok(()),
            Err(Error::ConnectionLost(reason)) => {
                tracing::error!(%reason, "relay connection closed");
                self.wire = None;
                self.state = RelayState::Disconnected;
                self.connect().await;
                Err(Error::ConnectionLost(
                    "relay connection closed unexpectedly".to_string(),
                ))
            }
            Err(other) => Err(other),
        }
    }
}

/// Cloneable send handle over a shared relay manager
#[derive(Clone)]
pub struct RelayHandle {
    inner: Arc<Mutex<RelayManager>>,
}

impl RelayHandle {
    /// Wrap a manager in a shared handle
    #[must_use]
    pub fn new(manager: RelayManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    /// Run the initial connection cycle
    pub async fn connect(&self) {
        self.inner.lock().await.connect().await;
    }

    /// Current session state
    pub async fn state(&self) -> RelayState {
        self.inner.lock().await.state()
    }
}

/// Relay send capability used by the dispatch router
#[async_trait]
pub trait RelaySink: Send + Sync {
    /// Forward a structured command to the relay
    async fn send(&self, command: RelayCommand) -> Result<()>;
}

#[async_trait]
impl RelaySink for RelayHandle {
    async fn send(&self, command: RelayCommand) -> Result<()> {
        self.inner.lock().await.send(&command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spoken_command_wire_shape() {
        let state = BotState::default();
        let cmd = RelayCommand::spoken("All systems go", &state);
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command"], "Overlord");
        assert_eq!(json["text"], "All systems go");
        assert_eq!(json["voice"], "default");
        assert!((json["speed"].as_f64().unwrap() - 1.2).abs() < f64::EPSILON);
        assert!((json["volume"].as_f64().unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn settings_command_wire_shape() {
        let mut state = BotState::default();
        state.set_tts_speed(0.9).unwrap();
        let cmd = RelayCommand::settings(&state);
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command"], "UpdateTTSSettings");
        assert!(json.get("text").is_none());
        assert!((json["speed"].as_f64().unwrap() - 0.9).abs() < f64::EPSILON);
    }
}
