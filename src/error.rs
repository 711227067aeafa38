use thiserror::Error;

use crate::config::StopPolicy;
use crate::station::Station;

/// Failures that are answered with a plain chat reply instead of the error embed.
#[derive(Debug, Error)]
pub enum RadioError {
    #[error("You need to join a voice channel first!")]
    NotInVoiceChannel,

    #[error("You need to {0} to stop the bot.")]
    Unauthorized(StopPolicy),

    #[error("The bot is not currently playing in a voice channel.")]
    NoActivePlayer,

    #[error("Failed to load the {station} station.")]
    StationLoadFailed { station: Station, reason: String },

    #[error("Failed to join your voice channel.")]
    VoiceConnectionFailed(String),

    #[error("This command must be used in a server.")]
    GuildOnly,

    #[error("Failed to register commands for {target}: {reason}")]
    RegistrationFailed { target: String, reason: String },
}
