use lavalink_rs::{client::LavalinkClient, hook, model::GuildId, model::events};
use twilight_model::id::Id;

use crate::radio::{EventSender, PlaybackEvent};

#[hook]
pub async fn ready_event(client: LavalinkClient, session_id: String, event: &events::Ready) {
    if let Err(error) = client.delete_all_player_contexts().await {
        tracing::warn!(?error, "Failed to clear stale Lavalink player contexts");
    }
    tracing::info!("{:?} -> {:?}", session_id, event);
}

#[hook]
pub async fn track_exception(
    client: LavalinkClient,
    _session_id: String,
    event: &events::TrackException,
) {
    publish_failure(&client, event.guild_id, format!("{:?}", event.exception));
}

#[hook]
pub async fn track_stuck(client: LavalinkClient, _session_id: String, event: &events::TrackStuck) {
    publish_failure(
        &client,
        event.guild_id,
        format!("stream stalled for {}ms", event.threshold_ms),
    );
}

fn publish_failure(client: &LavalinkClient, guild_id: GuildId, reason: String) {
    let Some(guild_id) = Id::new_checked(guild_id.0) else {
        return;
    };
    tracing::warn!(%guild_id, %reason, "Lavalink reported a playback failure");

    match client.data::<EventSender>() {
        Ok(events) => {
            let _ = events.send(PlaybackEvent::Failed { guild_id, reason });
        }
        Err(error) => tracing::debug!(?error, "Lavalink client carries no event sender"),
    }
}
