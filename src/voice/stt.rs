//! WebSocket speech-recognition source
//!
//! Subscribes to an external speech-to-text service that streams recognized
//! utterances as text frames. The stream is restartable: if the connection
//! drops, the reader reconnects and keeps producing.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use super::SpeechSource;
use crate::Result;

/// Delay before reconnecting a dropped recognition stream
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Buffer size for the utterance channel
const CHANNEL_CAPACITY: usize = 32;

/// Speech source backed by a websocket STT service
pub struct WsSpeechSource {
    url: String,
}

impl WsSpeechSource {
    /// Create a source for the given STT websocket URL
    #[must_use]
    pub const fn new(url: String) -> Self {
        Self { url }
    }
}

#[async_trait]
impl SpeechSource for WsSpeechSource {
    async fn subscribe(&mut self) -> Result<mpsc::Receiver<String>> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let url = self.url.clone();

        tokio::spawn(async move {
            loop {
                let mut stream = match tokio_tungstenite::connect_async(&url).await {
                    Ok((stream, _)) => {
                        tracing::info!(%url, "listening for voice commands");
                        stream
                    }
                    Err(e) => {
                        tracing::error!(error = %e, %url, "STT connection failed");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                        continue;
                    }
                };

                while let Some(frame) = stream.next().await {
                    match frame {
                        Ok(Message::Text(text)) => {
                            let text = text.trim().to_string();
                            if text.is_empty() {
                                continue;
                            }
                            if tx.send(text).await.is_err() {
                                // Subscriber gone; stop listening entirely
                                return;
                            }
                        }
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "STT stream error");
                            break;
                        }
                    }
                }

                if tx.is_closed() {
                    return;
                }
                tracing::info!("STT stream ended, reconnecting");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        });

        Ok(rx)
    }
}
