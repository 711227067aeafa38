use std::sync::Arc;

use async_trait::async_trait;
use songbird::input::HttpRequest;
use songbird::{Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent};
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker},
};

use super::{EventSender, PlaybackBackend, PlaybackEvent};
use crate::error::RadioError;
use crate::station::Station;

/// Streams the station over HTTP and decodes it in-process with songbird's driver.
pub struct DirectBackend {
    songbird: Arc<Songbird>,
    http: reqwest::Client,
    events: EventSender,
}

impl DirectBackend {
    pub fn new(songbird: Arc<Songbird>, events: EventSender) -> Self {
        Self {
            songbird,
            http: reqwest::Client::new(),
            events,
        }
    }
}

#[async_trait]
impl PlaybackBackend for DirectBackend {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn connect(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<(), RadioError> {
        self.songbird
            .join(guild_id, channel_id)
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
        let call = self
            .songbird
            .get(guild_id)
            .ok_or_else(|| RadioError::VoiceConnectionFailed("no voice call for guild".into()))?;

        let input = HttpRequest::new(self.http.clone(), url.to_string());
        let track = {
            let mut handler = call.lock().await;
            handler.play_only_input(input.into())
        };

        track
            .add_event(
                Event::Track(TrackEvent::Error),
                TrackErrorNotifier {
                    guild_id,
                    events: self.events.clone(),
                },
            )
            .map_err(|e| RadioError::StationLoadFailed {
                station,
                reason: e.to_string(),
            })?;

        // Surfaces unreachable or undecodable streams before we report success.
        track
            .make_playable_async()
            .await
            .map_err(|e| RadioError::StationLoadFailed {
                station,
                reason: e.to_string(),
            })?;

        tracing::debug!(%guild_id, %station, "Direct stream started");
        Ok(())
    }

    async fn disconnect(&self, guild_id: Id<GuildMarker>) -> anyhow::Result<()> {
        self.songbird.remove(guild_id).await?;
        Ok(())
    }
}

struct TrackErrorNotifier {
    guild_id: Id<GuildMarker>,
    events: EventSender,
}

#[async_trait]
impl VoiceEventHandler for TrackErrorNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(tracks) = ctx {
            for (state, _) in *tracks {
                let reason = format!("{:?}", state.playing);
                tracing::warn!(guild_id = %self.guild_id, %reason, "Station stream errored");
                let _ = self.events.send(PlaybackEvent::Failed {
                    guild_id: self.guild_id,
                    reason,
                });
            }
        }
        None
    }
}
