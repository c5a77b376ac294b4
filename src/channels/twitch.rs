//! Twitch chat adapter
//!
//! Speaks the Twitch flavor of IRC over a websocket connection. Incoming
//! PRIVMSGs are parsed into `IncomingMessage` and pushed to the receiver
//! handed out by `with_receiver`; outbound messages go through an internal
//! writer task so `send` never needs exclusive access to the socket.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use super::{Channel, ChatSink, IncomingMessage, OutgoingMessage};
use crate::{Error, Result};

/// Twitch IRC websocket endpoint
const TWITCH_IRC_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

/// Buffer size for the in/out message channels
const CHANNEL_CAPACITY: usize = 64;

/// A parsed inbound IRC line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcEvent {
    /// Server keepalive; must be answered with PONG
    Ping(String),
    /// A chat message
    Privmsg {
        author: String,
        channel: String,
        content: String,
    },
    /// Anything the gateway does not act on
    Other,
}

/// Twitch chat channel adapter
pub struct TwitchChannel {
    oauth_token: SecretString,
    bot_name: String,
    channel: String,
    incoming_tx: Option<mpsc::Sender<IncomingMessage>>,
    outbound_tx: Option<mpsc::Sender<String>>,
}

impl TwitchChannel {
    /// Create the adapter along with the receiver for inbound messages
    #[must_use]
    pub fn with_receiver(
        oauth_token: SecretString,
        bot_name: String,
        channel: String,
    ) -> (Self, mpsc::Receiver<IncomingMessage>) {
        let (incoming_tx, incoming_rx) = mpsc::channel(CHANNEL_CAPACITY);
        (
            Self {
                oauth_token,
                bot_name,
                channel,
                incoming_tx: Some(incoming_tx),
                outbound_tx: None,
            },
            incoming_rx,
        )
    }
}

#[async_trait]
impl Channel for TwitchChannel {
    fn name(&self) -> &'static str {
        "twitch"
    }

    async fn connect(&mut self) -> Result<()> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(TWITCH_IRC_URL).await?;
        let (mut write, mut read) = ws_stream.split();

        // IRC handshake: authenticate and join the configured channel
        let token = self.oauth_token.expose_secret();
        let pass = if token.starts_with("oauth:") {
            token.to_string()
        } else {
            format!("oauth:{token}")
        };
        write.send(Message::Text(format!("PASS {pass}"))).await?;
        write
            .send(Message::Text(format!("NICK {}", self.bot_name)))
            .await?;
        write
            .send(Message::Text(format!("JOIN #{}", self.channel)))
            .await?;

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        self.outbound_tx = Some(outbound_tx.clone());

        // Writer task: owns the sink half
        tokio::spawn(async move {
            while let Some(line) = outbound_rx.recv().await {
                if let Err(e) = write.send(Message::Text(line)).await {
                    tracing::error!(error = %e, "twitch write failed");
                    break;
                }
            }
        });

        // Reader task: parses IRC lines into chat events
        let incoming_tx = self
            .incoming_tx
            .take()
            .ok_or_else(|| Error::Channel("twitch adapter already connected".to_string()))?;
        let pong_tx = outbound_tx;
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => {
                        tracing::warn!("twitch connection closed by server");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::error!(error = %e, "twitch read failed");
                        break;
                    }
                };

                for line in text.lines() {
                    match parse_irc_line(line) {
                        IrcEvent::Ping(payload) => {
                            let _ = pong_tx.send(format!("PONG :{payload}")).await;
                        }
                        IrcEvent::Privmsg {
                            author,
                            channel,
                            content,
                        } => {
                            let message = IncomingMessage {
                                author,
                                content,
                                channel,
                            };
                            if incoming_tx.send(message).await.is_err() {
                                tracing::warn!("inbound receiver dropped, stopping reader");
                                return;
                            }
                        }
                        IrcEvent::Other => {}
                    }
                }
            }
        });

        tracing::info!(channel = %self.channel, "connected to twitch chat");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        // Dropping the outbound sender ends the writer task, which drops
        // the sink and closes the socket
        self.outbound_tx = None;
        Ok(())
    }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        let tx = self
            .outbound_tx
            .as_ref()
            .ok_or_else(|| Error::Channel("twitch adapter not connected".to_string()))?;
        tx.send(format!(
            "PRIVMSG #{} :{}",
            message.channel, message.content
        ))
        .await
        .map_err(|_| Error::Channel("twitch writer task stopped".to_string()))
    }

    fn is_connected(&self) -> bool {
        self.outbound_tx
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

#[async_trait]
impl ChatSink for TwitchChannel {
    async fn reply(&self, channel: &str, text: &str) -> Result<()> {
        self.send(OutgoingMessage {
            channel: channel.to_string(),
            content: text.to_string(),
        })
        .await
    }
}

/// Parse a single inbound IRC line
#[must_use]
pub fn parse_irc_line(line: &str) -> IrcEvent {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return IrcEvent::Other;
    }

    if let Some(payload) = line.strip_prefix("PING") {
        let payload = payload.trim_start().trim_start_matches(':');
        return IrcEvent::Ping(payload.to_string());
    }

    // Strip IRCv3 tags if present
    let line = if line.starts_with('@') {
        match line.split_once(' ') {
            Some((_, rest)) => rest,
            None => return IrcEvent::Other,
        }
    } else {
        line
    };

    // :nick!user@host PRIVMSG #channel :message text
    let Some(rest) = line.strip_prefix(':') else {
        return IrcEvent::Other;
    };
    let Some((prefix, rest)) = rest.split_once(' ') else {
        return IrcEvent::Other;
    };
    let Some(rest) = rest.strip_prefix("PRIVMSG ") else {
        return IrcEvent::Other;
    };
    let Some((target, content)) = rest.split_once(" :") else {
        return IrcEvent::Other;
    };

    let author = prefix.split('!').next().unwrap_or(prefix).to_lowercase();
    let channel = target.trim_start_matches('#').to_string();

    IrcEvent::Privmsg {
        author,
        channel,
        content: content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_privmsg() {
        let line = ":viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #skycaptain :!flightstatus";
        assert_eq!(
            parse_irc_line(line),
            IrcEvent::Privmsg {
                author: "viewer".to_string(),
                channel: "skycaptain".to_string(),
                content: "!flightstatus".to_string(),
            }
        );
    }

    #[test]
    fn parses_privmsg_with_tags() {
        let line = "@badge-info=;color=#FF0000 :mod!mod@mod.tmi.twitch.tv PRIVMSG #skycaptain :hey overlord";
        match parse_irc_line(line) {
            IrcEvent::Privmsg {
                author, content, ..
            } => {
                assert_eq!(author, "mod");
                assert_eq!(content, "hey overlord");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn lowercases_author() {
        let line = ":SkyCaptain!s@s.tmi.twitch.tv PRIVMSG #skycaptain :!bottoggle";
        match parse_irc_line(line) {
            IrcEvent::Privmsg { author, .. } => assert_eq!(author, "skycaptain"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parses_ping() {
        assert_eq!(
            parse_irc_line("PING :tmi.twitch.tv"),
            IrcEvent::Ping("tmi.twitch.tv".to_string())
        );
    }

    #[test]
    fn message_content_keeps_colons() {
        let line = ":v!v@v.tmi.twitch.tv PRIVMSG #c :!addalert note remember: fuel check";
        match parse_irc_line(line) {
            IrcEvent::Privmsg { content, .. } => {
                assert_eq!(content, "!addalert note remember: fuel check");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn ignores_noise() {
        assert_eq!(parse_irc_line(""), IrcEvent::Other);
        assert_eq!(
            parse_irc_line(":tmi.twitch.tv 001 bot :Welcome, GLHF!"),
            IrcEvent::Other
        );
    }
}
