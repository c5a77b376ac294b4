//! Daemon - the main gateway service
//!
//! Orchestrates the chat listener, dispatch router, relay connection,
//! flight poller, and voice pipeline as concurrently scheduled tasks
//! sharing only the bot state, the voice queue, and the relay handle.

use std::sync::Arc;

use tokio::sync::watch;

use crate::alerts::AlertStore;
use crate::agent::Responder;
use crate::channels::{Channel, ChatSink, TwitchChannel};
use crate::config::Config;
use crate::db::{self, ConversationRepo, DbPool};
use crate::flight::{NavmapClient, poller};
use crate::providers::OpenAiProvider;
use crate::relay::{RelayHandle, RelayManager, RelaySink};
use crate::router::{InboundEvent, Router};
use crate::state::BotState;
use crate::voice::{self, SpeechSource, VoiceQueue, stt::WsSpeechSource};
use crate::Result;

/// The Overlord daemon
pub struct Daemon {
    config: Config,
    db: DbPool,
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// # Errors
    ///
    /// Returns error if the data directory or database cannot be initialized
    pub fn new(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db_path = config.data_dir.join("overlord.db");
        let db = db::init(&db_path)?;
        tracing::info!(path = %db_path.display(), "database initialized");
        Ok(Self { config, db })
    }

    /// Run the daemon until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if a fatal startup step fails; runtime handler errors
    /// never surface here.
    pub async fn run(self) -> Result<()> {
        let state = BotState::new(
            self.config.personality.clone(),
            self.config.voice.prefix.clone(),
        )
        .into_shared();

        // Relay: initial bounded-retry cycle; later send failures re-trigger it
        let relay = RelayHandle::new(RelayManager::new(self.config.relay.clone()));
        relay.connect().await;

        let provider = Arc::new(OpenAiProvider::new(&self.config.openai)?);
        let history = ConversationRepo::new(self.db.clone());
        let responder = Responder::new(provider, history.clone(), Arc::clone(&state));

        let flight = Arc::new(NavmapClient::new(&self.config.flight.base_url));

        // Chat platform connection
        let (mut twitch, mut chat_rx) = TwitchChannel::with_receiver(
            self.config.twitch.oauth_token.clone(),
            self.config.twitch.bot_name.clone(),
            self.config.twitch.channel.clone(),
        );
        twitch.connect().await?;
        let chat: Arc<dyn ChatSink> = Arc::new(twitch);

        // Report simulator availability once at startup
        match flight.sim_info().await {
            Some(info) => tracing::info!(
                active = info.active,
                status = %info.simconnect_status,
                "connected to simulator"
            ),
            None => tracing::error!("failed to retrieve simulator information"),
        }

        let router = Arc::new(Router::new(
            Arc::clone(&state),
            AlertStore::with_defaults(),
            responder,
            history,
            Arc::clone(&flight),
            Arc::new(relay) as Arc<dyn RelaySink>,
            chat,
            &self.config.twitch.channel,
            &self.config.twitch.bot_name,
        ));

        // Shutdown signal fanned out to every background task
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
                let _ = shutdown_tx.send(true);
            }
        });

        tokio::spawn(poller::run(
            Arc::clone(&flight),
            self.config.flight.poll_interval,
            shutdown_rx.clone(),
        ));

        if self.config.voice.enabled {
            self.start_voice(Arc::clone(&state), Arc::clone(&router), &shutdown_rx)
                .await;
        } else {
            tracing::info!("voice disabled - running in chat-only mode");
        }

        tracing::info!(channel = %self.config.twitch.channel, "daemon running");

        // Chat event loop
        let mut shutdown = shutdown_rx;
        loop {
            tokio::select! {
                maybe = chat_rx.recv() => match maybe {
                    Some(message) => router.route(InboundEvent::Chat(message)).await,
                    None => {
                        tracing::warn!("chat connection closed");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("daemon stopped");
        Ok(())
    }

    /// Start the voice producer and consumer tasks
    async fn start_voice(
        &self,
        state: crate::state::SharedState,
        router: Arc<Router>,
        shutdown: &watch::Receiver<bool>,
    ) {
        let Some(stt_url) = self.config.voice.stt_url.clone() else {
            tracing::warn!("voice enabled but OVERLORD_STT_WS_URL is unset, skipping");
            return;
        };

        let mut source = WsSpeechSource::new(stt_url);
        let transcripts = match source.subscribe().await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::error!(error = %e, "failed to start speech recognition");
                return;
            }
        };

        let queue = Arc::new(VoiceQueue::new());
        tokio::spawn(voice::run_producer(
            transcripts,
            Arc::clone(&queue),
            state,
            shutdown.clone(),
        ));
        tokio::spawn(voice::run_consumer(queue, router, shutdown.clone()));
        tracing::info!("voice pipeline started");
    }
}
