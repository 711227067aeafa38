use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use twilight_http::Client as HttpClient;
use twilight_model::channel::message::Embed;
use twilight_model::id::{
    Id,
    marker::{ApplicationMarker, GuildMarker, UserMarker},
};
use twilight_model::util::{ImageHash, Timestamp};
use twilight_util::builder::embed::{
    EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder, ImageSource,
};

const EMBED_COLOR: u32 = 0xf0bfe9;
const THUMBNAIL_URL: &str = "https://ongaku.zvbt.space/favicon.png";
const INVITE_PERMISSIONS: u64 = 2_184_203_264;
const DESCRIPTION: &str = "Discover the best of Jpop and Kpop on Ongaku your go-to music bot \
for streaming all your favorite Japanese and Korean pop music hits. Dive into the latest \
tracks, timeless classics, and carefully curated playlists that celebrate the vibrant world \
of Jpop and Kpop music.";

/// Guild and member totals shown by `/info`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InfoReport {
    pub guilds: usize,
    pub members: u64,
}

impl InfoReport {
    /// One entry per guild; `None` is a guild whose count could not be fetched.
    pub fn tally<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = Option<u64>>,
    {
        counts
            .into_iter()
            .fold(Self::default(), |report, count| Self {
                guilds: report.guilds + 1,
                members: report.members + count.unwrap_or(0),
            })
    }

    pub fn summary(&self) -> String {
        format!("{} users in {} servers.", self.members, self.guilds)
    }
}

pub async fn collect(http: Arc<HttpClient>, guild_ids: Vec<Id<GuildMarker>>) -> InfoReport {
    let mut tasks = JoinSet::new();
    for guild_id in guild_ids {
        let http = http.clone();
        tasks.spawn(async move { fetch_member_count(&http, guild_id).await });
    }

    let mut counts = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        counts.push(joined.unwrap_or_else(|error| {
            tracing::warn!(?error, "Member count task failed");
            None
        }));
    }

    InfoReport::tally(counts)
}

async fn fetch_member_count(http: &HttpClient, guild_id: Id<GuildMarker>) -> Option<u64> {
    let response = match http.guild(guild_id).with_counts(true).await {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(%guild_id, ?error, "Failed to fetch guild details");
            return None;
        }
    };

    match response.model().await {
        Ok(guild) => guild.approximate_member_count,
        Err(error) => {
            tracing::warn!(%guild_id, ?error, "Failed to decode guild details");
            None
        }
    }
}

pub fn invite_url(application_id: Id<ApplicationMarker>) -> String {
    format!(
        "https://discord.com/oauth2/authorize?client_id={application_id}&permissions={INVITE_PERMISSIONS}&integration_type=0&scope=bot"
    )
}

pub fn avatar_url(user_id: Id<UserMarker>, avatar: Option<&ImageHash>) -> String {
    match avatar {
        Some(hash) => format!("https://cdn.discordapp.com/avatars/{user_id}/{hash}.png"),
        None => "https://cdn.discordapp.com/embed/avatars/0.png".to_string(),
    }
}

pub fn build_info_embed(
    report: &InfoReport,
    application_id: Id<ApplicationMarker>,
    bot_avatar_url: &str,
) -> anyhow::Result<Embed> {
    let mut embed = EmbedBuilder::new()
        .color(EMBED_COLOR)
        .title("Ongaku music bot")
        .url(invite_url(application_id))
        .thumbnail(ImageSource::url(THUMBNAIL_URL)?)
        .description(DESCRIPTION)
        .field(EmbedFieldBuilder::new("Stats", report.summary()))
        .footer(
            EmbedFooterBuilder::new("Click the link above to invite the bot!")
                .icon_url(ImageSource::url(bot_avatar_url)?),
        );

    match Timestamp::from_secs(Utc::now().timestamp()) {
        Ok(timestamp) => embed = embed.timestamp(timestamp),
        Err(error) => tracing::warn!(?error, "Failed to build timestamp for info embed"),
    }

    Ok(embed.build())
}
