use anyhow::Result;
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};

use super::resolve_caller;
use crate::command_handler::{
    Command, CommandContext, CommandResponseBuilder, GlobalState, StateExt,
};

#[derive(CommandModel, CreateCommand)]
#[command(name = "stop", desc = "Stop the radio and leave the voice channel.")]
pub struct StopCommand;

#[async_trait]
impl Command<GlobalState> for StopCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let guild_id = cmd_ctx.require_guild()?;
        let caller = resolve_caller(&state, cmd_ctx, guild_id)?;

        state.radio().stop(guild_id, &caller).await?;

        let response = CommandResponseBuilder::new()
            .content("Stopped the radio and disconnected from the voice channel.")
            .build();
        cmd_ctx.reply(response).await?;

        Ok(())
    }
}
