//! Inbound event dispatch
//!
//! Classifies every chat message and voice command and routes it to the
//! right handler: AI mentions, registry commands, streamer admin commands,
//! or nothing. Handler failures never escape `route`; they are logged and
//! converted to a best-effort apology.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::agent::{APOLOGY, Responder};
use crate::alerts::AlertStore;
use crate::channels::{ChatSink, IncomingMessage};
use crate::db::ConversationRepo;
use crate::flight::{self, NavmapClient};
use crate::relay::{RelayCommand, RelaySink};
use crate::state::SharedState;
use crate::{Error, Result};

/// An event entering the dispatch core
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A chat message from the platform
    Chat(IncomingMessage),
    /// A recognized voice command (already stripped of the voice prefix)
    Voice(String),
}

/// Registered chat commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Tts,
    AddAlert,
    Alert,
    Say,
    FlightStatus,
    Airport,
}

impl Command {
    /// Parse a lowercased command name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "tts" => Some(Self::Tts),
            "addalert" => Some(Self::AddAlert),
            "alert" => Some(Self::Alert),
            "say" => Some(Self::Say),
            "flightstatus" => Some(Self::FlightStatus),
            "airport" => Some(Self::Airport),
            _ => None,
        }
    }
}

/// Streamer-only admin sub-commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Config,
    Status,
    Clear,
    Personality,
    Toggle,
    VoicePrefix,
    TextPrefix,
    Verbose,
}

impl AdminCommand {
    /// Parse a lowercased admin sub-command name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "botconfig" => Some(Self::Config),
            "botstatus" => Some(Self::Status),
            "botclear" => Some(Self::Clear),
            "botpersonality" => Some(Self::Personality),
            "bottoggle" => Some(Self::Toggle),
            "botvoiceprefix" => Some(Self::VoicePrefix),
            "bottextprefix" => Some(Self::TextPrefix),
            "botverbose" => Some(Self::Verbose),
            _ => None,
        }
    }
}

/// The dispatch router
pub struct Router {
    state: SharedState,
    alerts: Mutex<AlertStore>,
    responder: Responder,
    history: ConversationRepo,
    flight: Arc<NavmapClient>,
    relay: Arc<dyn RelaySink>,
    chat: Arc<dyn ChatSink>,
    /// Privileged channel-owner login, lowercased
    streamer: String,
    /// Bot login for mention detection, lowercased
    bot_name: String,
}

impl Router {
    /// Create a router
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        state: SharedState,
        alerts: AlertStore,
        responder: Responder,
        history: ConversationRepo,
        flight: Arc<NavmapClient>,
        relay: Arc<dyn RelaySink>,
        chat: Arc<dyn ChatSink>,
        streamer: &str,
        bot_name: &str,
    ) -> Self {
        Self {
            state,
            alerts: Mutex::new(alerts),
            responder,
            history,
            flight,
            relay,
            chat,
            streamer: streamer.to_lowercase(),
            bot_name: bot_name.to_lowercase(),
        }
    }

    /// Route one inbound event
    ///
    /// Never fails: handler errors are logged here and converted into a
    /// best-effort apology so the event loop keeps running.
    pub async fn route(&self, event: InboundEvent) {
        match event {
            InboundEvent::Chat(message) => {
                if let Err(e) = self.dispatch_chat(&message).await {
                    tracing::error!(error = %e, author = %message.author, "chat dispatch failed");
                    let _ = self.chat.reply(&message.channel, APOLOGY).await;
                    self.relay_spoken(APOLOGY).await;
                }
            }
            InboundEvent::Voice(utterance) => {
                if let Err(e) = self.dispatch_voice(&utterance).await {
                    tracing::error!(error = %e, "voice dispatch failed");
                    self.relay_spoken(APOLOGY).await;
                }
            }
        }
    }

    /// Classify and dispatch a chat message
    async fn dispatch_chat(&self, message: &IncomingMessage) -> Result<()> {
        let content = message.content.trim();
        let lower = content.to_lowercase();
        let mention = format!("@{}", self.bot_name);

        let (triggered, text_prefix) = {
            let state = self.state.read().await;
            (
                state.matches_trigger(&lower) || lower.contains(&mention),
                state.text_prefix.to_lowercase(),
            )
        };

        if triggered {
            tracing::debug!(content, "handling bot mention");
            return self.handle_mention(content, &message.channel).await;
        }

        if lower.starts_with(&text_prefix) {
            let rest = content.get(text_prefix.len()..).unwrap_or_default();
            return self.handle_prefixed(rest, message).await;
        }

        if message.author == self.streamer {
            tracing::debug!(content, "handling streamer command");
            return self.handle_admin_line(content, &message.channel).await;
        }

        tracing::debug!(content, "regular chat message");
        Ok(())
    }

    /// Dispatch a voice command: trigger-phrase containment, relay-only output
    async fn dispatch_voice(&self, utterance: &str) -> Result<()> {
        let matched = self.state.read().await.matches_trigger(&utterance.to_lowercase());
        if !matched {
            tracing::debug!(%utterance, "ignoring voice command");
            return Ok(());
        }

        let response = self.responder.respond(utterance).await;
        tracing::info!(%response, "voice command response");
        let state = self.state.read().await.clone();
        self.relay.send(RelayCommand::spoken(response, &state)).await
    }

    /// Direct AI mention: reply goes to chat and the relay
    async fn handle_mention(&self, content: &str, channel: &str) -> Result<()> {
        let response = self.responder.respond(content).await;

        // TTS is best-effort; a relay outage must not silence chat
        self.relay_spoken(&response).await;
        self.chat.reply(channel, &response).await
    }

    /// A prefixed command line: admin names first, then the registry
    async fn handle_prefixed(&self, line: &str, message: &IncomingMessage) -> Result<()> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(());
        };
        let name = name.to_lowercase();
        let args: Vec<&str> = tokens.collect();

        if let Some(admin) = AdminCommand::parse(&name) {
            if message.author == self.streamer {
                let remainder = line
                    .split_once(char::is_whitespace)
                    .map(|(_, rest)| rest.trim())
                    .unwrap_or_default();
                return self.execute_admin(admin, remainder, &message.channel).await;
            }
            // Admin names from anyone else are ignored entirely
            tracing::debug!(author = %message.author, command = %name, "ignoring admin command from non-streamer");
            return Ok(());
        }

        if let Some(command) = Command::parse(&name) {
            tracing::info!(command = %name, ?args, "executing command");
            match self.execute(command, &args, &message.channel).await {
                Ok(Some(result)) => {
                    tracing::info!(%result, "command result");
                    self.relay_spoken(&result).await;
                    Ok(())
                }
                Ok(None) => Ok(()),
                Err(Error::UserInput(reason)) => {
                    // Recoverable: report back, keep prior state
                    self.chat.reply(&message.channel, &reason).await
                }
                Err(other) => Err(other),
            }
        } else {
            tracing::info!(command = %name, "unknown command");
            if let Err(e) = self
                .relay
                .send(RelayCommand::spoken(
                    format!("Unknown command: {name}"),
                    &self.state.read().await.clone(),
                ))
                .await
            {
                tracing::warn!(error = %e, "failed to relay unknown-command notice");
            }
            Ok(())
        }
    }

    /// Execute a registry command, returning the text forwarded to the relay
    async fn execute(
        &self,
        command: Command,
        args: &[&str],
        channel: &str,
    ) -> Result<Option<String>> {
        match command {
            Command::Tts => self.cmd_tts(args).await,
            Command::AddAlert => Ok(Some(self.cmd_add_alert(args).await)),
            Command::Alert => Ok(Some(self.cmd_alert(args).await)),
            Command::Say => self.cmd_say(args).await,
            Command::FlightStatus => self.cmd_flight_status(channel).await,
            Command::Airport => self.cmd_airport(args, channel).await,
        }
    }

    /// `tts <voice|speed|volume> <value>`
    async fn cmd_tts(&self, args: &[&str]) -> Result<Option<String>> {
        let (setting, value) = match args {
            [setting, value, ..] => (*setting, *value),
            _ => {
                return Err(Error::UserInput(
                    "Usage: tts <voice|speed|volume> <value>".to_string(),
                ));
            }
        };

        {
            let mut state = self.state.write().await;
            match setting.to_lowercase().as_str() {
                "voice" => state.tts_voice = value.to_string(),
                "speed" => {
                    let speed = value.parse().map_err(|_| {
                        Error::UserInput(format!("Invalid TTS speed: {value}"))
                    })?;
                    state.set_tts_speed(speed)?;
                }
                "volume" => {
                    let volume = value.parse().map_err(|_| {
                        Error::UserInput(format!("Invalid TTS volume: {value}"))
                    })?;
                    state.set_tts_volume(volume)?;
                }
                other => {
                    return Err(Error::UserInput(format!("Unknown TTS setting: {other}")));
                }
            }
        }

        let state = self.state.read().await.clone();
        self.relay.send(RelayCommand::settings(&state)).await?;
        Ok(None)
    }

    /// `addalert <name> <message...>`
    async fn cmd_add_alert(&self, args: &[&str]) -> String {
        if args.len() >= 2 {
            let name = args[0];
            let message = args[1..].join(" ");
            self.alerts.lock().await.set(name, &message);
            format!("Alert {name} added.")
        } else {
            "Invalid alert format.".to_string()
        }
    }

    /// `alert <name>`
    async fn cmd_alert(&self, args: &[&str]) -> String {
        match args.first() {
            None => "No alert specified.".to_string(),
            Some(name) => match self.alerts.lock().await.get(name) {
                None => format!("Alert {name} not found."),
                Some(alert) => alert.message.clone(),
            },
        }
    }

    /// `say <text...>`: forwarded verbatim to the relay
    async fn cmd_say(&self, args: &[&str]) -> Result<Option<String>> {
        let text = args.join(" ");
        tracing::info!(%text, "executing 'say' command");
        let state = self.state.read().await.clone();
        self.relay
            .send(RelayCommand::spoken(text.clone(), &state))
            .await?;
        Ok(Some(format!("Said: {text}")))
    }

    /// `flightstatus`: status sentence to chat and relay, apology on no data
    async fn cmd_flight_status(&self, channel: &str) -> Result<Option<String>> {
        match self.flight.sim_info().await {
            Some(info) => {
                let status = flight::format_flight_status(&info);
                self.chat.reply(channel, &status).await?;
                let state = self.state.read().await.clone();
                self.relay
                    .send(RelayCommand::spoken(status, &state))
                    .await?;
            }
            None => {
                self.chat.reply(channel, flight::FLIGHT_DATA_APOLOGY).await?;
            }
        }
        Ok(None)
    }

    /// `airport <ident>`: reply goes to chat only
    async fn cmd_airport(&self, args: &[&str], channel: &str) -> Result<Option<String>> {
        let Some(ident) = args.first() else {
            return Err(Error::UserInput("No airport specified.".to_string()));
        };
        let info = self.flight.airport_info(ident).await;
        let reply = flight::format_airport_info(ident, info.as_ref());
        self.chat.reply(channel, &reply).await?;
        Ok(None)
    }

    /// An unprefixed streamer line: recognized admin names execute, anything
    /// else is silently ignored
    async fn handle_admin_line(&self, content: &str, channel: &str) -> Result<()> {
        let Some(name) = content.split_whitespace().next() else {
            return Ok(());
        };
        let Some(admin) = AdminCommand::parse(&name.to_lowercase()) else {
            return Ok(());
        };
        let remainder = content
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .unwrap_or_default();
        self.execute_admin(admin, remainder, channel).await
    }

    /// Execute an admin sub-command and echo a confirmation to chat
    async fn execute_admin(
        &self,
        command: AdminCommand,
        remainder: &str,
        channel: &str,
    ) -> Result<()> {
        let confirmation = match command {
            AdminCommand::Config => "Bot configuration command received.".to_string(),
            AdminCommand::Status => {
                let state = self.state.read().await;
                let status = if state.active { "active" } else { "inactive" };
                format!("Bot is currently {status}.")
            }
            AdminCommand::Clear => {
                self.history.clear_all()?;
                "Conversation history cleared.".to_string()
            }
            AdminCommand::Personality => {
                if remainder.is_empty() {
                    return Err(Error::UserInput("No personality specified.".to_string()));
                }
                self.state.write().await.personality = remainder.to_string();
                format!("Bot personality changed to: {remainder}")
            }
            AdminCommand::Toggle => {
                let active = self.state.write().await.toggle_active();
                let status = if active { "activated" } else { "deactivated" };
                format!("Bot has been {status}.")
            }
            AdminCommand::VoicePrefix => {
                self.state.write().await.set_voice_prefix(remainder)?;
                format!("Voice command prefix changed to: {remainder}")
            }
            AdminCommand::TextPrefix => {
                self.state.write().await.set_text_prefix(remainder)?;
                format!("Text command prefix changed to: {remainder}")
            }
            AdminCommand::Verbose => {
                let verbose = self.state.write().await.toggle_verbose();
                let status = if verbose { "enabled" } else { "disabled" };
                format!("Verbose mode {status}.")
            }
        };

        self.chat.reply(channel, &confirmation).await
    }

    /// Best-effort spoken output; a relay failure is logged, never raised
    async fn relay_spoken(&self, text: &str) {
        let state = self.state.read().await.clone();
        if let Err(e) = self.relay.send(RelayCommand::spoken(text, &state)).await {
            tracing::warn!(error = %e, "relay unavailable, skipping TTS");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_parse() {
        assert_eq!(Command::parse("tts"), Some(Command::Tts));
        assert_eq!(Command::parse("addalert"), Some(Command::AddAlert));
        assert_eq!(Command::parse("alert"), Some(Command::Alert));
        assert_eq!(Command::parse("say"), Some(Command::Say));
        assert_eq!(Command::parse("flightstatus"), Some(Command::FlightStatus));
        assert_eq!(Command::parse("airport"), Some(Command::Airport));
        assert_eq!(Command::parse("dance"), None);
    }

    #[test]
    fn admin_parse() {
        assert_eq!(
            AdminCommand::parse("botpersonality"),
            Some(AdminCommand::Personality)
        );
        assert_eq!(AdminCommand::parse("bottoggle"), Some(AdminCommand::Toggle));
        assert_eq!(AdminCommand::parse("botstatus"), Some(AdminCommand::Status));
        assert_eq!(AdminCommand::parse("botclear"), Some(AdminCommand::Clear));
        assert_eq!(AdminCommand::parse("botnonsense"), None);
        // Registry names are not admin names
        assert_eq!(AdminCommand::parse("say"), None);
    }
}
