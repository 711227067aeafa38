use std::sync::Arc;

use twilight_gateway::Event;
use twilight_model::application::interaction::InteractionData;
use twilight_model::id::{Id, marker::UserMarker};
use twilight_model::voice::VoiceState;

use crate::radio::RadioService;
use crate::state::State;

/// Drops the guild's player when the bot itself left voice. Returns whether a player was
/// dropped.
fn forget_on_self_disconnect(
    radio: &RadioService,
    current_user_id: Option<Id<UserMarker>>,
    voice_state: &VoiceState,
) -> bool {
    if current_user_id != Some(voice_state.user_id) || voice_state.channel_id.is_some() {
        return false;
    }
    voice_state
        .guild_id
        .is_some_and(|guild_id| radio.forget(guild_id).is_some())
}

pub async fn process(event: Event, state: Arc<State>) -> anyhow::Result<()> {
    match event {
        Event::Ready(ready) => {
            tracing::info!(
                user = %ready.user.name,
                guilds = ready.guilds.len(),
                "Ongaku Bot is online!"
            );
            state
                .registrar
                .register_on_ready(ready.guilds.iter().map(|guild| guild.id))
                .await;
        }
        Event::GuildCreate(guild_create) => {
            let guild_id = guild_create.id();
            match state.registrar.register_new_guild(guild_id).await {
                Ok(true) => tracing::info!(%guild_id, "Joined a new guild, commands registered"),
                Ok(false) => {}
                Err(error) => tracing::error!(%guild_id, %error, "Failed to register commands for new guild"),
            }
        }
        Event::VoiceStateUpdate(update) => {
            let current_user_id = state.cache.current_user().map(|user| user.id);
            forget_on_self_disconnect(&state.radio, current_user_id, &update.0);
        }
        Event::InteractionCreate(interaction_payload) => {
            let mut interaction = interaction_payload.0;

            match std::mem::take(&mut interaction.data) {
                Some(InteractionData::ApplicationCommand(data)) => {
                    if let Err(e) =
                        crate::command_handler::slash_handler(interaction, *data, state.clone())
                            .await
                    {
                        tracing::error!(error = ?e, "Error handling slash command");
                    }
                }
                _ => {
                    tracing::warn!("Ignoring non-application-command interaction");
                }
            }
        }
        _ => {}
    }
    Ok(())
}
