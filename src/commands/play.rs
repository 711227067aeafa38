use anyhow::Result;
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};

use super::resolve_caller;
use crate::command_handler::{
    Command, CommandContext, CommandResponseBuilder, GlobalState, StateExt,
};
use crate::error::RadioError;
use crate::station::Station;

#[derive(CommandModel, CreateCommand)]
#[command(name = "play", desc = "Play a radio station in your voice channel.")]
pub struct PlayCommand {
    #[command(desc = "The station to play")]
    pub station: Station,
}

#[async_trait]
impl Command<GlobalState> for PlayCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let guild_id = cmd_ctx.require_guild()?;
        let PlayCommand { station } = cmd_ctx.parse::<PlayCommand>()?;
        let caller = resolve_caller(&state, cmd_ctx, guild_id)?;

        // Refusals go out as an immediate reply, before deferring.
        if caller.voice_channel_id.is_none() {
            return Err(RadioError::NotInVoiceChannel.into());
        }

        cmd_ctx.defer().await?;
        state
            .radio()
            .play(guild_id, &caller, cmd_ctx.channel_id(), station)
            .await?;

        let response = CommandResponseBuilder::new()
            .content(format!("Playing the {station} radio!"))
            .build();
        cmd_ctx.reply(response).await?;

        Ok(())
    }
}
