use twilight_model::application::interaction::{Interaction, application_command::CommandData};

use crate::command_handler::definition::GlobalState;
use crate::commands::COMMANDS;

pub async fn slash_handler(
    interaction: Interaction,
    data: CommandData,
    state: GlobalState,
) -> anyhow::Result<()> {
    for cmd_def in COMMANDS.iter() {
        if cmd_def.name == data.name.as_str() {
            return (cmd_def.slash_executor)(state, interaction, data).await;
        }
    }
    tracing::warn!("Unknown slash command: {}", data.name);
    Ok(())
}
