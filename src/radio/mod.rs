mod backend;
mod caller;
pub mod direct;
pub mod lavalink;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, broadcast};
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker},
};

use crate::config::StopPolicy;
use crate::error::RadioError;
use crate::station::{Station, StationUrls};

pub use backend::PlaybackBackend;
pub use caller::Caller;
pub use direct::DirectBackend;
pub use lavalink::LavalinkBackend;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerStatus {
    Connecting,
    Playing,
}

/// The single radio session a guild may have.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildPlayer {
    pub voice_channel_id: Id<ChannelMarker>,
    pub text_channel_id: Option<Id<ChannelMarker>>,
    pub station: Station,
    pub status: PlayerStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started {
        guild_id: Id<GuildMarker>,
        station: Station,
    },
    Stopped {
        guild_id: Id<GuildMarker>,
    },
    Failed {
        guild_id: Id<GuildMarker>,
        reason: String,
    },
}

pub type EventSender = broadcast::Sender<PlaybackEvent>;

pub fn event_channel() -> EventSender {
    broadcast::channel(64).0
}

/// Owns every guild's player and drives the configured backend.
pub struct RadioService {
    backend: Arc<dyn PlaybackBackend>,
    stations: StationUrls,
    stop_policy: StopPolicy,
    players: DashMap<Id<GuildMarker>, GuildPlayer>,
    // Held across a whole play or stop so one guild's lifecycle changes never interleave.
    lifecycles: DashMap<Id<GuildMarker>, Arc<Mutex<()>>>,
    events: EventSender,
}

impl RadioService {
    pub fn new(
        backend: Arc<dyn PlaybackBackend>,
        stations: StationUrls,
        stop_policy: StopPolicy,
        events: EventSender,
    ) -> Self {
        Self {
            backend,
            stations,
            stop_policy,
            players: DashMap::new(),
            lifecycles: DashMap::new(),
            events,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn stop_policy(&self) -> StopPolicy {
        self.stop_policy
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    pub fn player(&self, guild_id: Id<GuildMarker>) -> Option<GuildPlayer> {
        self.players.get(&guild_id).map(|entry| entry.value().clone())
    }

    pub fn active_players(&self) -> usize {
        self.players.len()
    }

    fn lifecycle(&self, guild_id: Id<GuildMarker>) -> Arc<Mutex<()>> {
        self.lifecycles.entry(guild_id).or_default().clone()
    }

    /// Starts `station` in the caller's voice channel, replacing whatever the guild was
    /// playing before.
    #[tracing::instrument(skip(self, caller), fields(user = %caller.user_id))]
    pub async fn play(
        &self,
        guild_id: Id<GuildMarker>,
        caller: &Caller,
        text_channel_id: Option<Id<ChannelMarker>>,
        station: Station,
    ) -> Result<GuildPlayer, RadioError> {
        let voice_channel_id = caller
            .voice_channel_id
            .ok_or(RadioError::NotInVoiceChannel)?;

        let lifecycle = self.lifecycle(guild_id);
        let _guard = lifecycle.lock().await;

        self.players.insert(
            guild_id,
            GuildPlayer {
                voice_channel_id,
                text_channel_id,
                station,
                status: PlayerStatus::Connecting,
            },
        );

        if let Err(error) = self.start(guild_id, voice_channel_id, station).await {
            tracing::warn!(%error, "Failed to start radio, tearing down");
            self.players.remove(&guild_id);
            if let Err(teardown) = self.backend.disconnect(guild_id).await {
                tracing::debug!(error = ?teardown, "Nothing to tear down after failed start");
            }
            let _ = self.events.send(PlaybackEvent::Failed {
                guild_id,
                reason: error.to_string(),
            });
            return Err(error);
        }

        let player = GuildPlayer {
            voice_channel_id,
            text_channel_id,
            station,
            status: PlayerStatus::Playing,
        };
        self.players.insert(guild_id, player.clone());
        let _ = self
            .events
            .send(PlaybackEvent::Started { guild_id, station });
        tracing::info!(backend = self.backend.name(), %station, "Radio started");

        Ok(player)
    }

    async fn start(
        &self,
        guild_id: Id<GuildMarker>,
        voice_channel_id: Id<ChannelMarker>,
        station: Station,
    ) -> Result<(), RadioError> {
        self.backend.connect(guild_id, voice_channel_id).await?;
        self.backend
            .stream(guild_id, station, self.stations.url(station))
            .await
    }

    /// Tears down the guild's player. Permission is checked before anything else so an
    /// unauthorized caller never learns or changes the player state.
    #[tracing::instrument(skip(self, caller), fields(user = %caller.user_id))]
    pub async fn stop(
        &self,
        guild_id: Id<GuildMarker>,
        caller: &Caller,
    ) -> Result<GuildPlayer, RadioError> {
        if !self.stop_policy.permits(caller) {
            return Err(RadioError::Unauthorized(self.stop_policy));
        }

        let lifecycle = self.lifecycle(guild_id);
        let _guard = lifecycle.lock().await;

        let (_, player) = self
            .players
            .remove(&guild_id)
            .ok_or(RadioError::NoActivePlayer)?;

        if let Err(error) = self.backend.disconnect(guild_id).await {
            tracing::warn!(?error, "Voice teardown reported an error");
        }
        let _ = self.events.send(PlaybackEvent::Stopped { guild_id });
        tracing::info!("Radio stopped");

        Ok(player)
    }

    /// Drops the player without touching the backend, for when the bot was already
    /// removed from voice by someone else.
    pub fn forget(&self, guild_id: Id<GuildMarker>) -> Option<GuildPlayer> {
        let (_, player) = self.players.remove(&guild_id)?;
        let _ = self.events.send(PlaybackEvent::Stopped { guild_id });
        tracing::info!(%guild_id, "Forgot player after external voice disconnect");
        Some(player)
    }
}
