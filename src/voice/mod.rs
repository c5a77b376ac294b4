//! Voice command queue and trigger matching
//!
//! Recognized utterances arrive from a background execution context, so the
//! producer hands them into the cooperative domain through a thread-safe
//! queue; the consumer drains it with a non-blocking poll and feeds the
//! dispatch router.

pub mod stt;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::Result;
use crate::router::{InboundEvent, Router};
use crate::state::SharedState;

/// Consumer poll interval when the queue is empty
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A speech-recognition collaborator
///
/// Produces an infinite, restartable stream of recognized utterance
/// strings; the gateway only subscribes, it never initiates recognition.
#[async_trait]
pub trait SpeechSource: Send {
    /// Start recognition and return the utterance receiver
    ///
    /// # Errors
    ///
    /// Returns error if the recognition stream cannot be started
    async fn subscribe(&mut self) -> Result<mpsc::Receiver<String>>;
}

/// Thread-safe FIFO of pending voice commands
///
/// `push` never blocks; `try_pop` never waits.
pub struct VoiceQueue {
    tx: mpsc::UnboundedSender<String>,
    rx: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl VoiceQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Enqueue a command (never blocks)
    pub fn push(&self, command: String) {
        // Send only fails when the queue itself has been dropped
        let _ = self.tx.send(command);
    }

    /// Dequeue a command without waiting
    #[must_use]
    pub fn try_pop(&self) -> Option<String> {
        let mut rx = self.rx.lock().ok()?;
        rx.try_recv().ok()
    }
}

impl Default for VoiceQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Gate an utterance on the voice prefix
///
/// Returns the remainder (trimmed, original casing) when the utterance
/// starts with the prefix case-insensitively; `None` otherwise.
#[must_use]
pub fn match_voice_prefix(utterance: &str, prefix: &str) -> Option<String> {
    let prefix_lower = prefix.to_lowercase();
    if prefix_lower.is_empty() {
        return None;
    }
    if !utterance.to_lowercase().starts_with(&prefix_lower) {
        return None;
    }
    utterance
        .get(prefix_lower.len()..)
        .map(|rest| rest.trim().to_string())
}

/// Producer loop: reads recognized utterances, gates them on the voice
/// prefix, and enqueues the remainder
///
/// New input is dropped while the bot is inactive. Exits when the
/// recognition stream ends or the shutdown signal fires.
pub async fn run_producer(
    mut transcripts: mpsc::Receiver<String>,
    queue: Arc<VoiceQueue>,
    state: SharedState,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let utterance = tokio::select! {
            maybe = transcripts.recv() => match maybe {
                Some(text) => text,
                None => {
                    tracing::warn!("speech recognition stream ended");
                    return;
                }
            },
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::debug!("voice producer stopping");
                    return;
                }
                continue;
            }
        };

        tracing::info!(%utterance, "recognized voice input");

        let (active, prefix) = {
            let state = state.read().await;
            (state.active, state.voice_prefix.clone())
        };
        if !active {
            tracing::debug!("bot inactive, dropping voice input");
            continue;
        }

        match match_voice_prefix(&utterance, &prefix) {
            Some(command) => queue.push(command),
            None => tracing::debug!(%utterance, "utterance missing voice prefix, discarded"),
        }
    }
}

/// Consumer loop: drains the queue into the dispatch router
///
/// Polls without blocking, yielding briefly when the queue is empty. Exits
/// on the shutdown signal.
pub async fn run_consumer(
    queue: Arc<VoiceQueue>,
    router: Arc<Router>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            tracing::debug!("voice consumer stopping");
            return;
        }

        if let Some(command) = queue.try_pop() {
            tracing::info!(%command, "processing voice command from queue");
            router.route(InboundEvent::Voice(command)).await;
            continue;
        }

        tokio::select! {
            () = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = shutdown.changed() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_match_strips_and_trims() {
        assert_eq!(
            match_voice_prefix("hey bot what is my altitude", "hey bot"),
            Some("what is my altitude".to_string())
        );
    }

    #[test]
    fn prefix_match_is_case_insensitive() {
        assert_eq!(
            match_voice_prefix("Hey Bot SAY hello", "hey bot"),
            Some("SAY hello".to_string())
        );
    }

    #[test]
    fn non_matching_utterance_discarded() {
        assert_eq!(match_voice_prefix("what is my altitude", "hey bot"), None);
    }

    #[test]
    fn prefix_must_be_at_start() {
        assert_eq!(match_voice_prefix("so hey bot do a thing", "hey bot"), None);
    }

    #[test]
    fn queue_fifo_order() {
        let queue = VoiceQueue::new();
        queue.push("first".to_string());
        queue.push("second".to_string());
        assert_eq!(queue.try_pop(), Some("first".to_string()));
        assert_eq!(queue.try_pop(), Some("second".to_string()));
        assert_eq!(queue.try_pop(), None);
    }

    #[tokio::test]
    async fn producer_enqueues_prefixed_and_discards_rest() {
        let (tx, rx) = mpsc::channel(8);
        let queue = Arc::new(VoiceQueue::new());
        let state = crate::state::BotState::default().into_shared();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let producer = tokio::spawn(run_producer(
            rx,
            Arc::clone(&queue),
            state,
            shutdown_rx,
        ));

        tx.send("hey bot what is my altitude".to_string())
            .await
            .unwrap();
        tx.send("unrelated chatter".to_string()).await.unwrap();
        drop(tx);
        producer.await.unwrap();
        drop(shutdown_tx);

        assert_eq!(queue.try_pop(), Some("what is my altitude".to_string()));
        assert_eq!(queue.try_pop(), None);
    }

    #[tokio::test]
    async fn producer_drops_input_when_inactive() {
        let (tx, rx) = mpsc::channel(8);
        let queue = Arc::new(VoiceQueue::new());
        let state = crate::state::BotState::default().into_shared();
        state.write().await.active = false;
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let producer = tokio::spawn(run_producer(rx, Arc::clone(&queue), state, shutdown_rx));

        tx.send("hey bot say hello".to_string()).await.unwrap();
        drop(tx);
        producer.await.unwrap();

        assert_eq!(queue.try_pop(), None);
    }
}
