use anyhow::Result;
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};

use crate::command_handler::{
    Command, CommandContext, CommandResponseBuilder, GlobalState, HasHttpClient, StateExt,
};
use crate::info::{self, InfoReport};

#[derive(CommandModel, CreateCommand)]
#[command(name = "info", desc = "Show information about the bot.")]
pub struct InfoCommand;

#[async_trait]
impl Command<GlobalState> for InfoCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let guild_ids: Vec<_> = state
            .cache()
            .iter()
            .guilds()
            .map(|guild| *guild.key())
            .collect();

        let avatar_url = state
            .cache()
            .current_user()
            .map(|user| info::avatar_url(user.id, user.avatar.as_ref()))
            .unwrap_or_else(|| info::avatar_url(cmd_ctx.interaction.application_id.cast(), None));

        let report = if guild_ids.is_empty() {
            InfoReport::default()
        } else {
            cmd_ctx.defer().await?;
            info::collect(state.http_client(), guild_ids).await
        };
        tracing::debug!(guilds = report.guilds, members = report.members, "Collected info stats");

        let embed =
            info::build_info_embed(&report, cmd_ctx.interaction.application_id, &avatar_url)?;
        let response = CommandResponseBuilder::new().embed(embed).build();
        cmd_ctx.reply(response).await?;

        Ok(())
    }
}
