use async_trait::async_trait;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker},
};

use crate::error::RadioError;
use crate::station::Station;

/// A way of getting a station's audio into a guild's voice channel.
///
/// Implementations keep their own per-guild connection handles; [`super::RadioService`]
/// decides when each method is called and owns the guild → player bookkeeping.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Joins `channel_id`, or moves there if the guild already has a connection.
    async fn connect(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<(), RadioError>;

    /// Replaces whatever the guild is playing with the stream at `url`.
    async fn stream(
        &self,
        guild_id: Id<GuildMarker>,
        station: Station,
        url: &str,
    ) -> Result<(), RadioError>;

    async fn disconnect(&self, guild_id: Id<GuildMarker>) -> anyhow::Result<()>;
}
