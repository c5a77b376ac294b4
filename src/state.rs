//! Runtime bot state
//!
//! Mutable configuration shared by every handler: active flag, command
//! prefixes, personality, and TTS parameters. Mutated only by streamer
//! admin commands and the `tts` command.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{Error, Result};

/// Default trigger phrases that mark a message as directed at the bot
pub const DEFAULT_TRIGGER_PHRASES: &[&str] = &[
    "ok overlord",
    "hey overlord",
    "your ai overlord",
    "@your ai overlord",
];

/// Shared handle to the runtime bot state
pub type SharedState = Arc<RwLock<BotState>>;

/// Mutable runtime configuration
///
/// Invariants: `tts_speed` and `tts_volume` stay positive finite, prefixes
/// stay non-empty. Enforced by the setters; direct field reads are fine.
#[derive(Debug, Clone)]
pub struct BotState {
    /// Whether the voice pipeline accepts input
    pub active: bool,
    /// Prefix for text chat commands
    pub text_prefix: String,
    /// Prefix for recognized voice utterances
    pub voice_prefix: String,
    /// System prompt for the AI responder
    pub personality: String,
    /// Verbose relay logging
    pub verbose: bool,
    /// TTS voice identifier
    pub tts_voice: String,
    /// TTS speed multiplier
    pub tts_speed: f64,
    /// TTS volume
    pub tts_volume: f64,
    /// Trigger phrases matched as substrings, lowercased
    pub trigger_phrases: Vec<String>,
}

impl Default for BotState {
    fn default() -> Self {
        Self {
            active: true,
            text_prefix: "!".to_string(),
            voice_prefix: "hey bot".to_string(),
            personality: "You are a helpful Twitch chat assistant.".to_string(),
            verbose: false,
            tts_voice: "default".to_string(),
            tts_speed: 1.2,
            tts_volume: 1.0,
            trigger_phrases: DEFAULT_TRIGGER_PHRASES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl BotState {
    /// Create state with a custom personality and voice prefix
    #[must_use]
    pub fn new(personality: String, voice_prefix: String) -> Self {
        Self {
            personality,
            voice_prefix,
            ..Self::default()
        }
    }

    /// Wrap state in a shared handle
    #[must_use]
    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Set the TTS speed
    ///
    /// # Errors
    ///
    /// Returns `Error::UserInput` if the value is not a positive finite
    /// number; the previous value is retained.
    pub fn set_tts_speed(&mut self, speed: f64) -> Result<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Error::UserInput(format!("invalid TTS speed: {speed}")));
        }
        self.tts_speed = speed;
        Ok(())
    }

    /// Set the TTS volume
    ///
    /// # Errors
    ///
    /// Returns `Error::UserInput` if the value is not a positive finite
    /// number; the previous value is retained.
    pub fn set_tts_volume(&mut self, volume: f64) -> Result<()> {
        if !volume.is_finite() || volume <= 0.0 {
            return Err(Error::UserInput(format!("invalid TTS volume: {volume}")));
        }
        self.tts_volume = volume;
        Ok(())
    }

    /// Set the text command prefix
    ///
    /// # Errors
    ///
    /// Returns `Error::UserInput` if the prefix is empty.
    pub fn set_text_prefix(&mut self, prefix: &str) -> Result<()> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(Error::UserInput("text prefix cannot be empty".to_string()));
        }
        self.text_prefix = prefix.to_string();
        Ok(())
    }

    /// Set the voice command prefix
    ///
    /// # Errors
    ///
    /// Returns `Error::UserInput` if the prefix is empty.
    pub fn set_voice_prefix(&mut self, prefix: &str) -> Result<()> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(Error::UserInput("voice prefix cannot be empty".to_string()));
        }
        self.voice_prefix = prefix.to_string();
        Ok(())
    }

    /// Flip the active flag, returning the new value
    pub const fn toggle_active(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    /// Flip verbose logging, returning the new value
    pub const fn toggle_verbose(&mut self) -> bool {
        self.verbose = !self.verbose;
        self.verbose
    }

    /// Check whether lowercased content contains any trigger phrase
    #[must_use]
    pub fn matches_trigger(&self, content_lower: &str) -> bool {
        self.trigger_phrases
            .iter()
            .any(|phrase| content_lower.contains(phrase.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let state = BotState::default();
        assert!(state.active);
        assert_eq!(state.text_prefix, "!");
        assert_eq!(state.voice_prefix, "hey bot");
        assert!((state.tts_speed - 1.2).abs() < f64::EPSILON);
        assert!((state.tts_volume - 1.0).abs() < f64::EPSILON);
        assert_eq!(state.trigger_phrases.len(), 4);
    }

    #[test]
    fn rejects_nonpositive_speed() {
        let mut state = BotState::default();
        assert!(state.set_tts_speed(0.0).is_err());
        assert!(state.set_tts_speed(-1.5).is_err());
        assert!(state.set_tts_speed(f64::NAN).is_err());
        assert!(state.set_tts_speed(f64::INFINITY).is_err());
        // Prior value intact
        assert!((state.tts_speed - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn accepts_valid_volume() {
        let mut state = BotState::default();
        state.set_tts_volume(0.5).unwrap();
        assert!((state.tts_volume - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_empty_prefix() {
        let mut state = BotState::default();
        assert!(state.set_text_prefix("  ").is_err());
        assert_eq!(state.text_prefix, "!");
    }

    #[test]
    fn trigger_matching_is_substring() {
        let state = BotState::default();
        assert!(state.matches_trigger("well hey overlord, how are you"));
        assert!(!state.matches_trigger("hello chat"));
    }

    #[test]
    fn toggles() {
        let mut state = BotState::default();
        assert!(!state.toggle_active());
        assert!(state.toggle_active());
        assert!(state.toggle_verbose());
    }
}
