//! Relay transport seam
//!
//! `RelayManager` talks to the relay through these traits so tests can
//! substitute a scripted transport for the real websocket.

use async_trait::async_trait;
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Error, Result};

/// Opens relay sessions
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Open a session to `url`
    async fn connect(&self, url: &str) -> Result<Box<dyn RelayWire>>;
}

/// An open relay session
#[async_trait]
pub trait RelayWire: Send {
    /// Send one text frame
    ///
    /// # Errors
    ///
    /// Returns `Error::ConnectionLost` when the transport has closed;
    /// other transport errors map to `Error::WebSocket`.
    async fn send_text(&mut self, text: String) -> Result<()>;
}

/// Production websocket transport
pub struct WsTransport;

#[async_trait]
impl RelayTransport for WsTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn RelayWire>> {
        let (stream, _) = tokio_tungstenite::connect_async(url).await?;
        Ok(Box::new(WsWire { stream }))
    }
}

/// Websocket-backed relay session
struct WsWire {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl RelayWire for WsWire {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| match e {
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::AlreadyClosed
                | tungstenite::Error::Io(_) => Error::ConnectionLost(e.to_string()),
                other => Error::WebSocket(other),
            })
    }
}
