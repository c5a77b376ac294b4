//! Configuration for the Overlord gateway
//!
//! All configuration is environment-driven. Required variables are
//! validated up front so a misconfigured process fails before the daemon
//! starts rather than at first use.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::{Error, Result};

/// Environment variables that must be present
const REQUIRED_VARS: &[&str] = &[
    "TWITCH_OAUTH_TOKEN",
    "TWITCH_CHANNEL",
    "OPENAI_API_KEY",
    "OVERLORD_RELAY_URL",
];

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Twitch connection settings
    pub twitch: TwitchConfig,

    /// AI completion provider settings
    pub openai: OpenAiConfig,

    /// TTS relay connection settings
    pub relay: RelaySettings,

    /// Flight-data provider settings
    pub flight: FlightConfig,

    /// Voice pipeline settings
    pub voice: VoiceSettings,

    /// Default personality (system prompt)
    pub personality: String,

    /// Data directory (conversation database)
    pub data_dir: PathBuf,
}

/// Twitch connection settings
#[derive(Debug, Clone)]
pub struct TwitchConfig {
    /// OAuth token ("oauth:..." form)
    pub oauth_token: SecretString,
    /// Channel to join; its owner is the privileged streamer identity
    pub channel: String,
    /// Bot account login, used for mention detection
    pub bot_name: String,
}

/// AI completion provider settings
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key
    pub api_key: SecretString,
    /// Model identifier
    pub model: String,
    /// API base URL
    pub base_url: String,
}

/// TTS relay connection settings
///
/// The retry parameters here are the single canonical source; nothing else
/// in the crate hardcodes attempt counts or delays.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// WebSocket URL of the relay
    pub url: String,
    /// Maximum sequential connection attempts per cycle
    pub max_attempts: u32,
    /// Delay between failed attempts
    pub retry_delay: Duration,
}

/// Flight-data provider settings
#[derive(Debug, Clone)]
pub struct FlightConfig {
    /// Base URL of the LittleNavmap-style HTTP API
    pub base_url: String,
    /// Interval between periodic sim-info polls
    pub poll_interval: Duration,
}

/// Voice pipeline settings
#[derive(Debug, Clone)]
pub struct VoiceSettings {
    /// Enable the voice command pipeline
    pub enabled: bool,
    /// WebSocket URL of the speech-recognition stream
    pub stt_url: Option<String>,
    /// Prefix a recognized utterance must start with
    pub prefix: String,
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming every missing required variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function
    ///
    /// The seam lets tests supply variables without mutating the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming every missing required variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .filter(|name| lookup(name).is_none_or(|v| v.trim().is_empty()))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let channel = lookup("TWITCH_CHANNEL").unwrap_or_default().to_lowercase();
        let bot_name = lookup("TWITCH_BOT_NAME")
            .unwrap_or_else(|| channel.clone())
            .to_lowercase();

        let twitch = TwitchConfig {
            oauth_token: SecretString::from(lookup("TWITCH_OAUTH_TOKEN").unwrap_or_default()),
            channel,
            bot_name,
        };

        let openai = OpenAiConfig {
            api_key: SecretString::from(lookup("OPENAI_API_KEY").unwrap_or_default()),
            model: lookup("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            base_url: lookup("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        };

        let relay = RelaySettings {
            url: lookup("OVERLORD_RELAY_URL").unwrap_or_default(),
            max_attempts: parse_or(&lookup, "OVERLORD_RELAY_MAX_ATTEMPTS", 5u32)?,
            retry_delay: Duration::from_secs(parse_or(
                &lookup,
                "OVERLORD_RELAY_RETRY_DELAY_SECS",
                5u64,
            )?),
        };

        let flight = FlightConfig {
            base_url: lookup("NAVMAP_API_URL")
                .unwrap_or_else(|| "http://localhost:8965/api".to_string()),
            poll_interval: Duration::from_secs(parse_or(
                &lookup,
                "OVERLORD_FLIGHT_POLL_SECS",
                60u64,
            )?),
        };

        let voice = VoiceSettings {
            enabled: lookup("OVERLORD_VOICE_ENABLED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            stt_url: lookup("OVERLORD_STT_WS_URL"),
            prefix: lookup("OVERLORD_VOICE_PREFIX").unwrap_or_else(|| "hey bot".to_string()),
        };

        let personality = lookup("OVERLORD_PERSONALITY")
            .unwrap_or_else(|| "You are a helpful Twitch chat assistant.".to_string());

        let data_dir = lookup("OVERLORD_DATA_DIR").map_or_else(default_data_dir, PathBuf::from);

        Ok(Self {
            twitch,
            openai,
            relay,
            flight,
            voice,
            personality,
            data_dir,
        })
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_attempts: 5,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Parse an optional integer variable, falling back to a default
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{name} must be an integer, got {raw:?}"))),
    }
}

/// Platform data directory, falling back to the current directory
fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "overlord", "overlord-gateway")
        .map_or_else(|| PathBuf::from("."), |dirs| dirs.data_dir().to_path_buf())
}
