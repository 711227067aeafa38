use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use lavalink_rs::client::LavalinkClient;
use lavalink_rs::model::events as LavalinkEventsModel;
use lavalink_rs::node::NodeBuilder;
use lavalink_rs::prelude::NodeDistributionStrategy;
use songbird::Songbird;
use songbird::shards::TwilightMap;
use tokio::sync::{broadcast, oneshot};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{ConfigBuilder, Intents, Shard, ShardId};
use twilight_http::Client as HttpClient;
use twilight_model::gateway::payload::outgoing::update_presence::UpdatePresencePayload;
use twilight_model::gateway::presence::{ActivityType, MinimalActivity, Status};
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

use crate::command_handler::{CommandRegistrar, HttpCommandSink};
use crate::commands;
use crate::config::{Config, LavalinkConfig, PlaybackBackendKind};
use crate::gateway::runner;
use crate::lavalink_events;
use crate::radio::{
    self, DirectBackend, EventSender, LavalinkBackend, PlaybackBackend, PlaybackEvent,
    RadioService,
};
use crate::state::State;

pub struct Bot {
    pub shard: Shard,
    pub state: Arc<State>,
}

impl Bot {
    pub fn new(shard: Shard, state: Arc<State>) -> Self {
        Self { shard, state }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global default tracing subscriber: {}", e))?;
    Ok(())
}

fn load_config_and_env_sync() -> anyhow::Result<Config> {
    if let Err(e) = dotenv() {
        tracing::debug!(error = %e, "No .env file loaded, using process environment only");
    }
    Config::from_env()
}

fn init_http_client(config: &Config) -> Arc<HttpClient> {
    Arc::new(HttpClient::new(config.token.clone()))
}

fn init_cache() -> InMemoryCache {
    InMemoryCache::builder()
        .resource_types(
            ResourceType::GUILD
                | ResourceType::ROLE
                | ResourceType::VOICE_STATE
                | ResourceType::USER_CURRENT,
        )
        .build()
}

fn init_shard(config: &Config, presence: UpdatePresencePayload) -> Shard {
    let config = ConfigBuilder::new(
        config.token.clone(),
        Intents::GUILDS | Intents::GUILD_VOICE_STATES,
    )
    .presence(presence)
    .build();
    Shard::with_config(ShardId::ONE, config)
}

fn presence() -> anyhow::Result<UpdatePresencePayload> {
    Ok(UpdatePresencePayload::new(
        [MinimalActivity {
            name: "BANGERS".to_string(),
            kind: ActivityType::Listening,
            url: None,
        }
        .into()],
        false,
        None,
        Status::Online,
    )?)
}

async fn init_lavalink_client(
    config: &LavalinkConfig,
    user_id: Id<UserMarker>,
    events: EventSender,
) -> anyhow::Result<Arc<LavalinkClient>> {
    let lavalink_events_handlers = LavalinkEventsModel::Events {
        ready: Some(lavalink_events::ready_event),
        track_exception: Some(lavalink_events::track_exception),
        track_stuck: Some(lavalink_events::track_stuck),
        ..Default::default()
    };

    let node_local = NodeBuilder {
        hostname: config.address(),
        is_ssl: config.is_ssl,
        events: LavalinkEventsModel::Events::default(),
        password: config.password.clone(),
        user_id: user_id.into(),
        session_id: None,
    };

    let client = LavalinkClient::new_with_data(
        lavalink_events_handlers,
        vec![node_local],
        NodeDistributionStrategy::round_robin(),
        Arc::new(events),
    )
    .await;
    tracing::info!(node = %config.address(), "Lavalink client initialized");
    Ok(Arc::new(client))
}

async fn init_songbird_client(
    shard_sender: twilight_gateway::MessageSender,
    shard_id_number: u32,
    user_id: Id<UserMarker>,
) -> anyhow::Result<Arc<Songbird>> {
    let senders = TwilightMap::new(HashMap::from([(shard_id_number, shard_sender)]));
    Ok(Arc::new(Songbird::twilight(Arc::new(senders), user_id)))
}

async fn init_backend(
    config: &Config,
    user_id: Id<UserMarker>,
    songbird: Arc<Songbird>,
    events: EventSender,
) -> anyhow::Result<Arc<dyn PlaybackBackend>> {
    match config.backend {
        PlaybackBackendKind::Lavalink => {
            let lavalink_config = config
                .lavalink
                .as_ref()
                .context("Lavalink backend selected without Lavalink settings")?;
            let lavalink = init_lavalink_client(lavalink_config, user_id, events)
                .await
                .context("Failed to initialize Lavalink client")?;
            Ok(Arc::new(LavalinkBackend::new(lavalink, songbird)))
        }
        PlaybackBackendKind::Direct => Ok(Arc::new(DirectBackend::new(songbird, events))),
    }
}

fn spawn_playback_event_logger(state: Arc<State>) {
    let mut events = state.radio.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(PlaybackEvent::Started { guild_id, station }) => {
                    tracing::info!(%guild_id, %station, active = state.radio.active_players(), "Playback started");
                }
                Ok(PlaybackEvent::Stopped { guild_id }) => {
                    tracing::info!(%guild_id, active = state.radio.active_players(), "Playback stopped");
                }
                Ok(PlaybackEvent::Failed { guild_id, reason }) => {
                    tracing::warn!(%guild_id, %reason, "Playback failed");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Playback event logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::info!("Playback event channel closed, logger exiting.");
    });
}

pub async fn initialize_and_run_bot() -> anyhow::Result<()> {
    init_tracing().context("Failed to initialize tracing")?;
    tracing::info!("Ongaku Bot starting up...");

    let config =
        load_config_and_env_sync().context("Failed to load configuration and .env file")?;

    let http_client = init_http_client(&config);

    let current_user_id = http_client
        .current_user()
        .await
        .context("Failed to get current user from Discord")?
        .model()
        .await
        .context("Failed to model current user data")?
        .id;

    let application_id = http_client
        .current_user_application()
        .await
        .context("Failed to get current user application")?
        .model()
        .await
        .context("Failed to model current user application")?
        .id;

    let initial_shard = init_shard(&config, presence()?);

    let songbird_client = init_songbird_client(
        initial_shard.sender(),
        initial_shard.id().number() as u32,
        current_user_id,
    )
    .await
    .context("Failed to initialize Songbird client")?;

    let events = radio::event_channel();
    let backend = init_backend(&config, current_user_id, songbird_client.clone(), events.clone())
        .await
        .context("Failed to initialize playback backend")?;

    let radio = RadioService::new(
        backend,
        config.stations.clone(),
        config.stop_policy,
        events,
    );
    tracing::info!(
        backend = radio.backend_name(),
        stop_policy = ?radio.stop_policy(),
        "Playback configured"
    );

    let registrar = CommandRegistrar::new(
        Arc::new(HttpCommandSink::new(http_client.clone(), application_id)),
        config.command_scope,
        commands::descriptors(),
    );
    tracing::info!(scope = ?registrar.scope(), "Command registration configured");

    let app_state = Arc::new(State::new(
        http_client,
        init_cache(),
        songbird_client,
        radio,
        registrar,
    ));

    spawn_playback_event_logger(app_state.clone());

    let bot = Bot::new(initial_shard, app_state);

    tracing::info!("Bot initialized. Connecting to gateway and running event loop...");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let runner_handle = tokio::spawn(async move { runner(bot, shutdown_rx).await });

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "Failed to listen for ctrl_c signal");
        let _ = shutdown_tx.send(());
    } else {
        tracing::info!("Ctrl+C received. Initiating graceful shutdown...");
        if shutdown_tx.send(()).is_err() {
            tracing::warn!(
                "Failed to send shutdown signal to gateway runner; it might have already exited."
            );
        }
    }

    tracing::info!("Waiting for gateway runner to complete...");
    match runner_handle.await {
        Ok(Ok(_)) => tracing::info!("Gateway runner finished successfully."),
        Ok(Err(e)) => tracing::error!(error = ?e, "Gateway runner failed."),
        Err(e) => tracing::error!(error = ?e, "Gateway runner task panicked or was cancelled."),
    }

    tracing::info!("Shutdown complete.");
    Ok(())
}
