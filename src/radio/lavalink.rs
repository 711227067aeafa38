use std::sync::Arc;

use async_trait::async_trait;
use lavalink_rs::client::LavalinkClient;
use lavalink_rs::model::player::ConnectionInfo;
use lavalink_rs::prelude::TrackLoadData;
use songbird::ConnectionInfo as SongbirdConnectionInfo;
use songbird::Songbird;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker},
};

use super::PlaybackBackend;
use crate::error::RadioError;
use crate::station::Station;

fn convert_connection_info(connection_info: SongbirdConnectionInfo) -> ConnectionInfo {
    ConnectionInfo {
        endpoint: connection_info.endpoint,
        token: connection_info.token,
        session_id: connection_info.session_id,
    }
}

/// Songbird performs the voice handshake; the Lavalink node does the streaming.
pub struct LavalinkBackend {
    lavalink: Arc<LavalinkClient>,
    songbird: Arc<Songbird>,
}

impl LavalinkBackend {
    pub fn new(lavalink: Arc<LavalinkClient>, songbird: Arc<Songbird>) -> Self {
        Self { lavalink, songbird }
    }
}

#[async_trait]
impl PlaybackBackend for LavalinkBackend {
    fn name(&self) -> &'static str {
        "lavalink"
    }

    async fn connect(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<(), RadioError> {
        let (connection_info, _) = self
            .songbird
            .join_gateway(guild_id, channel_id)
            .await
            .map_err(|e| RadioError::VoiceConnectionFailed(e.to_string()))?;

        self.lavalink
            .create_player_context(guild_id, convert_connection_info(connection_info))
            .await
            .map_err(|e| RadioError::VoiceConnectionFailed(e.to_string()))?;

        Ok(())
    }

    async fn stream(
        &self,
        guild_id: Id<GuildMarker>,
        station: Station,
        url: &str,
    ) -> Result<(), RadioError> {
        let load_failed = |reason: String| RadioError::StationLoadFailed { station, reason };

        let player = self
            .lavalink
            .get_player_context(guild_id)
            .ok_or_else(|| load_failed("no player context for guild".to_string()))?;

        let loaded = self
            .lavalink
            .load_tracks(guild_id, url)
            .await
            .map_err(|e| load_failed(e.to_string()))?;

        let mut track = match loaded.data {
            Some(TrackLoadData::Track(track)) => track,
            Some(TrackLoadData::Search(results)) => results
                .into_iter()
                .next()
                .ok_or_else(|| load_failed("search returned no tracks".to_string()))?,
            Some(TrackLoadData::Playlist(playlist)) => playlist
                .tracks
                .into_iter()
                .next()
                .ok_or_else(|| load_failed("playlist was empty".to_string()))?,
            Some(TrackLoadData::Error(e)) => return Err(load_failed(e.message)),
            None => return Err(load_failed("received no data from Lavalink".to_string())),
        };

        track.user_data = Some(serde_json::json!({ "station": station.key() }));

        player
            .play_now(&track)
            .await
            .map_err(|e| load_failed(e.to_string()))?;

        tracing::debug!(%guild_id, title = %track.info.title, "Lavalink stream started");
        Ok(())
    }

    async fn disconnect(&self, guild_id: Id<GuildMarker>) -> anyhow::Result<()> {
        let voice = self.songbird.remove(guild_id).await;
        self.lavalink.delete_player(guild_id).await?;
        voice?;
        Ok(())
    }
}
